//! Turns a project's source files into one loaded module.
//!
//! Every source file holds WebAssembly text *module fields* (`func`, `global`,
//! `memory`, `export`, ...) rather than a complete `(module ...)`. All files are
//! spliced into a single compilation unit, so a function defined in one file can
//! be called by `$name` from another. The unit is compiled to the WebAssembly
//! binary format, handed to a [`ModuleLoader`], and the version the loaded module
//! declares about itself is read back.
//!
//! A build either yields a fully loaded module with its version or fails as a
//! whole. Syntax errors are reported before the loader is ever called, and a
//! module the loader accepted is dropped again if its version can't be read.

use std::borrow::Cow ;
use std::io::Read ;
use itertools::Itertools ;
use nonempty_collections::NEVec ;
use rand::Rng ;
use rand::distributions::Alphanumeric ;
use thiserror::Error ;

use crate::loader::{ LoadError, LoadedModule, ModuleLoader, ModuleVersion };



const RANDOM_SUFFIX_LEN: usize = 8 ;

/// A compiler error, located in the source file it came from where possible.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct Diagnostic {
	/// Name of the source file the message points into.
	pub source: Option<String>,
	/// 1-based line within `source`.
	pub line: Option<usize>,
	/// 1-based column.
	pub column: Option<usize>,
	pub message: String,
}

impl std::fmt::Display for Diagnostic {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "error: " )?;
		if let Some( source ) = &self.source { write!( f, "{}:", source )?; }
		if let Some( line ) = self.line { write!( f, "{}:", line )?; }
		if let Some( column ) = self.column { write!( f, "{}:", column )?; }
		if self.source.is_some() || self.line.is_some() { write!( f, " " )?; }
		write!( f, "{}", self.message )
	}
}

/// Errors that fail a compilation. No module is produced in any of these cases.
#[derive( Error, Debug )]
pub enum CompileError {
	/// A source stream couldn't be read.
	#[error( "IO Error reading source '{name}': {source}" )]
	Io { name: String, source: std::io::Error },
	/// The sources don't form a valid module.
	#[error( "Compilation of '{module}' failed:\n{}", .diagnostics.iter().join( "\n" ))]
	Diagnostics { module: String, diagnostics: Vec<Diagnostic> },
	/// The loader rejected the binary or its version metadata.
	#[error( "Load Error: {0}" )]
	Load( #[from] LoadError ),
}

impl CompileError {
	/// The compiler's diagnostics, if the failure came from the sources themselves.
	pub fn diagnostics( &self ) -> &[Diagnostic] {
		match self {
			Self::Diagnostics { diagnostics, .. } => diagnostics,
			_ => &[],
		}
	}
}

/// A module built from at least one source file and loaded into the host.
#[derive( Debug )]
pub struct CompiledModule<M> {
	name: String,
	binary: Vec<u8>,
	sources: NEVec<String>,
	version: ModuleVersion,
	module: M,
}

impl<M> CompiledModule<M> {

	/// The process-unique name the module was loaded under.
	#[inline] pub fn name( &self ) -> &str { &self.name }

	/// The WebAssembly binary that was loaded.
	#[inline] pub fn binary( &self ) -> &[u8] { &self.binary }

	/// Names of the source files, in compilation order.
	#[inline] pub fn sources( &self ) -> &NEVec<String> { &self.sources }

	/// Version the module declared after it was loaded.
	#[inline] pub fn version( &self ) -> ModuleVersion { self.version }

	/// The loader's handle to the module.
	#[inline] pub fn module( &self ) -> &M { &self.module }
	#[inline] pub fn module_mut( &mut self ) -> &mut M { &mut self.module }
	#[inline] pub fn into_module( self ) -> M { self.module }

}

/// Result of a compilation that didn't fail.
#[derive( Debug )]
pub enum CompileOutcome<M> {
	/// There was nothing to compile. Neither the compiler nor the loader ran.
	NoSources,
	Compiled( CompiledModule<M> ),
}

impl<M> CompileOutcome<M> {
	pub fn into_compiled( self ) -> Option<CompiledModule<M>> {
		match self {
			Self::NoSources => None,
			Self::Compiled( module ) => Some( module ),
		}
	}
}

struct SourceText {
	name: String,
	text: String,
}

/// Named sources accumulated for a single compilation.
///
/// Each stream is read to the end and released inside [`SourceUnit::load`], so
/// only one source is ever open at a time.
#[derive( Default )]
pub struct SourceUnit {
	sources: Vec<SourceText>,
}

impl SourceUnit {

	pub fn new() -> Self { Self::default() }

	/// Reads `reader` to the end and adds its content under `name`.
	///
	/// # Errors
	/// Returns an error if the stream can't be read or isn't UTF-8.
	pub fn load( &mut self, name: impl Into<String>, mut reader: impl Read ) -> Result<(), CompileError> {
		let name = name.into();
		let mut text = String::new();
		match reader.read_to_string( &mut text ) {
			Ok( _ ) => {
				self.sources.push( SourceText { name, text });
				Ok(())
			},
			Err( source ) => Err( CompileError::Io { name, source }),
		}
	}

	#[inline] pub fn len( &self ) -> usize { self.sources.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.sources.is_empty() }

}

/// Where one source's text starts inside the spliced unit.
struct Span {
	name: String,
	first_line: usize,
	line_count: usize,
}

/// Compiles source files into a loaded module.
#[derive( Debug, Default, Clone, Copy )]
pub struct ModuleCompiler ;

impl ModuleCompiler {

	pub fn new() -> Self { Self }

	/// Reads every `( name, stream )` pair, then compiles and loads them as one module.
	///
	/// An empty input returns [`CompileOutcome::NoSources`] without compiling anything.
	///
	/// # Errors
	/// See [`ModuleCompiler::compile_unit`]; additionally fails if a stream can't be read.
	pub fn compile<L, R>(
		&self,
		files: impl IntoIterator<Item = ( String, R )>,
		module_name: &str,
		loader: &mut L,
	) -> Result<CompileOutcome<L::Module>, CompileError>
	where
		L: ModuleLoader,
		R: Read,
	{
		let mut unit = SourceUnit::new();
		files.into_iter().try_for_each(|( name, reader )| unit.load( name, reader ))?;
		self.compile_unit( unit, module_name, loader )
	}

	/// Compiles the accumulated sources and loads the result under `module_name`.
	///
	/// `module_name` should be unique for the process; see [`unique_module_name`].
	///
	/// # Errors
	/// Fails with [`CompileError::Diagnostics`] if the sources don't parse, in which
	/// case the loader is never called, or with [`CompileError::Load`] if the loader
	/// rejects the binary or the module's version metadata.
	pub fn compile_unit<L: ModuleLoader>(
		&self,
		unit: SourceUnit,
		module_name: &str,
		loader: &mut L,
	) -> Result<CompileOutcome<L::Module>, CompileError> {

		let names = unit.sources.iter().map(| source | source.name.clone() ).collect();
		let Some( sources ) = NEVec::try_from_vec( names ) else {
			tracing::debug!( module = module_name, "no sources, skipping compilation" );
			return Ok( CompileOutcome::NoSources );
		};

		let ( text, spans ) = splice( module_name, &unit.sources );
		let binary = wat::parse_str( &text ).map_err(| err | CompileError::Diagnostics {
			module: module_name.to_string(),
			diagnostics: vec![ diagnose( &err.to_string(), &text, &spans ) ],
		})?;

		let mut module = loader.load( module_name, &binary )?;
		let version = module.declared_version()?;

		tracing::info!( module = module_name, %version, sources = unit.len(), bytes = binary.len(), "module compiled and loaded" );
		Ok( CompileOutcome::Compiled( CompiledModule {
			name: module_name.to_string(),
			binary,
			sources,
			version,
			module,
		}))

	}

}

/// Builds a module name from `friendly_name` that won't collide with earlier builds:
/// `{friendly_name}_{8 random characters}`.
///
/// Characters that can't appear in a WebAssembly text identifier become `_`.
pub fn unique_module_name( friendly_name: &str ) -> String {
	let suffix = rand::thread_rng()
		.sample_iter( &Alphanumeric )
		.take( RANDOM_SUFFIX_LEN )
		.map(| byte | char::from( byte ).to_ascii_lowercase() )
		.collect::<String>();
	format!( "{}_{}", sanitise_identifier( friendly_name ), suffix )
}

fn is_id_char( c: char ) -> bool {
	c.is_ascii_alphanumeric() || "!#$%&'*+-./:<=>?@\\^_`|~".contains( c )
}

fn sanitise_identifier( name: &str ) -> String {
	name.chars().map(| c | match is_id_char( c ) { true => c, false => '_' }).collect()
}

fn splice( module_name: &str, sources: &[SourceText] ) -> ( String, Vec<Span> ) {

	let identifier = sanitise_identifier( module_name );
	let mut text = match identifier.is_empty() {
		true => String::from( "(module\n" ),
		false => format!( "(module ${}\n", identifier ),
	};
	let mut line = 2 ;
	let mut spans = Vec::with_capacity( sources.len() );

	for source in sources {
		text.push_str( ";; " );
		text.push_str( &source.name.replace([ '\n', '\r' ], " " ));
		text.push( '\n' );
		line += 1 ;

		let fields = module_fields( &source.text );
		let line_count = fields.lines().count();
		spans.push( Span { name: source.name.clone(), first_line: line, line_count });
		text.push_str( &fields );
		if !fields.ends_with( '\n' ) { text.push( '\n' ); }
		line += line_count.max( 1 );
	}

	text.push( ')' );
	( text, spans )

}

/// Reduces a source written as a whole `(module ...)` to its fields.
///
/// The wrapper is blanked out rather than cut, so lines and columns still match the file.
fn module_fields( text: &str ) -> Cow<'_, str> {
	let Some(( open, close )) = module_wrapper( text ) else { return Cow::Borrowed( text ) };
	let blank = | part: &str | part.chars()
		.map(| c | match c { '\n' | '\r' => c, _ => ' ' })
		.collect::<String>();
	Cow::Owned( format!( "{}{} {}", blank( &text[ ..open ] ), &text[ open..close ], &text[ close + 1.. ] ))
}

/// Byte offsets of the first field inside an outer `(module ...)` and of its closing paren.
fn module_wrapper( text: &str ) -> Option<( usize, usize )> {

	let mut rest = text.trim_start();
	while let Some( comment ) = rest.strip_prefix( ";;" ) {
		rest = comment.split_once( '\n' ).map_or( "", |( _, next )| next ).trim_start();
	}

	let after = rest.strip_prefix( "(module" )?;
	if !after.starts_with(| c: char | c.is_whitespace() || c == '(' || c == ')' ) { return None }
	let after = after.trim_start();
	let after = match after.strip_prefix( '$' ) {
		Some( identifier ) => identifier.trim_start_matches( is_id_char ),
		None => after,
	};

	let open = text.len() - after.len();
	let trimmed = text.trim_end();
	if !trimmed.ends_with( ')' ) { return None }
	let close = trimmed.len() - 1 ;
	( close >= open ).then_some(( open, close ))

}

/// Turns a rendered wat error into a diagnostic pointing into the original source file.
fn diagnose( rendered: &str, text: &str, spans: &[Span] ) -> Diagnostic {

	let message = rendered.lines().next().unwrap_or( rendered );
	let ( message, location ) = match message.rsplit_once( " at byte offset " ) {
		Some(( message, offset )) => ( message, offset.trim().parse::<usize>().ok().map(| offset | line_col_at( text, offset ))),
		None => ( message, rendered.lines().find_map( parse_location )),
	};

	let mapped = location.and_then(|( line, column )| spans.iter()
		.find(| span | line >= span.first_line && line < span.first_line + span.line_count.max( 1 ))
		.map(| span | ( span.name.clone(), line - span.first_line + 1, column ))
	);

	match mapped {
		Some(( source, line, column )) => Diagnostic {
			source: Some( source ),
			line: Some( line ),
			column: Some( column ),
			message: message.to_string(),
		},
		None => Diagnostic {
			source: None,
			line: None,
			column: None,
			message: rendered.to_string(),
		},
	}

}

/// Parses `--> file:line:col` as printed under a wat error message.
fn parse_location( line: &str ) -> Option<( usize, usize )> {
	let location = line.trim_start().strip_prefix( "--> " )?;
	let mut parts = location.rsplitn( 3, ':' );
	let column = parts.next()?.trim().parse().ok()?;
	let line = parts.next()?.trim().parse().ok()?;
	Some(( line, column ))
}

fn line_col_at( text: &str, offset: usize ) -> ( usize, usize ) {
	let before = &text.as_bytes()[ ..offset.min( text.len() ) ];
	let line = before.iter().filter(| &&byte | byte == b'\n' ).count() + 1 ;
	let column = before.iter().rev().take_while(| &&byte | byte != b'\n' ).count() + 1 ;
	( line, column )
}

#[cfg( test )]
mod tests {

	use super::* ;

	fn unit_of( sources: &[( &str, &str )] ) -> Vec<SourceText> {
		sources.iter()
			.map(|( name, text )| SourceText { name: ( *name ).to_string(), text: ( *text ).to_string() })
			.collect()
	}

	#[test]
	fn splice_wraps_all_sources_in_one_module() {
		let ( text, spans ) = splice( "demo", &unit_of( &[
			( "a.wat", "(func $a)" ),
			( "b.wat", "(func $b)\n(func $c)\n" ),
		]));
		assert_eq!( text, "(module $demo\n;; a.wat\n(func $a)\n;; b.wat\n(func $b)\n(func $c)\n)" );
		assert_eq!( spans.iter().map(| span | ( span.first_line, span.line_count )).collect::<Vec<_>>(), vec![( 3, 1 ), ( 5, 2 )]);
		assert!( wat::parse_str( &text ).is_ok() );
	}

	#[test]
	fn splice_sanitises_module_identifier() {
		let ( text, _ ) = splice( "My Plugin (beta)", &unit_of( &[( "a.wat", "" )]));
		assert!( text.starts_with( "(module $My_Plugin__beta_\n" ));
		assert!( wat::parse_str( &text ).is_ok() );
	}

	#[test]
	fn whole_module_sources_keep_their_layout() {
		assert_eq!( module_fields( "(module $m\n  (func $f))\n" ), "          \n  (func $f) \n" );
		assert_eq!( module_fields( ";; header\n(module)" ), "         \n        " );
		assert_eq!( module_fields( "(func $f)\n(func $g)" ), "(func $f)\n(func $g)" );
		assert_eq!( module_fields( "(func $modulex)" ), "(func $modulex)" );
	}

	#[test]
	fn errors_inside_whole_modules_keep_their_line() {
		let sources = unit_of( &[
			( "a.wat", "(func $a)" ),
			( "b.wat", "(module $b\n  (func $b)\n  (func $c (result i32)\n    i32.const oops))\n" ),
		]);
		let ( text, spans ) = splice( "demo", &sources );
		let err = wat::parse_str( &text ).expect_err( "source is invalid" );
		let diagnostic = diagnose( &err.to_string(), &text, &spans );
		assert_eq!( diagnostic.source.as_deref(), Some( "b.wat" ));
		assert_eq!( diagnostic.line, Some( 4 ));
	}

	#[test]
	fn unique_names_differ_and_keep_the_friendly_prefix() {
		let first = unique_module_name( "Tool Switcher" );
		let second = unique_module_name( "Tool Switcher" );
		assert_ne!( first, second );
		assert!( first.starts_with( "Tool_Switcher_" ));
		assert_eq!( first.len(), "Tool_Switcher_".len() + RANDOM_SUFFIX_LEN );
		assert!( first.chars().all( is_id_char ));
	}

	#[test]
	fn location_line_is_parsed() {
		assert_eq!( parse_location( "     --> <anon>:12:7" ), Some(( 12, 7 )));
		assert_eq!( parse_location( "  --> C:\\dir\\file.wat:3:1" ), Some(( 3, 1 )));
		assert_eq!( parse_location( "expected `)`" ), None );
	}

	#[test]
	fn errors_map_back_to_their_source_file() {
		let sources = unit_of( &[
			( "a.wat", "(func $a)" ),
			( "b.wat", "(func $b)\n(func $c (result i32)\n  i32.const oops)" ),
		]);
		let ( text, spans ) = splice( "demo", &sources );
		let err = wat::parse_str( &text ).expect_err( "source is invalid" );
		let diagnostic = diagnose( &err.to_string(), &text, &spans );
		assert_eq!( diagnostic.source.as_deref(), Some( "b.wat" ));
		assert_eq!( diagnostic.line, Some( 3 ));
	}

	#[test]
	fn byte_offsets_convert_to_line_and_column() {
		assert_eq!( line_col_at( "ab\ncd\nef", 0 ), ( 1, 1 ));
		assert_eq!( line_col_at( "ab\ncd\nef", 4 ), ( 2, 2 ));
		assert_eq!( line_col_at( "ab", 99 ), ( 1, 3 ));
	}

	#[test]
	fn unreadable_stream_reports_its_name() {
		struct Broken ;
		impl Read for Broken {
			fn read( &mut self, _: &mut [u8] ) -> std::io::Result<usize> {
				Err( std::io::Error::other( "disk on fire" ))
			}
		}
		let mut unit = SourceUnit::new();
		match unit.load( "broken.wat", Broken ) {
			Err( CompileError::Io { name, .. }) => assert_eq!( name, "broken.wat" ),
			other => panic!( "Expected Io error, got: {:?}", other ),
		}
		assert!( unit.is_empty() );
	}

	#[test]
	fn diagnostic_display_includes_location() {
		let diagnostic = Diagnostic {
			source: Some( "b.wat".into() ),
			line: Some( 3 ),
			column: Some( 13 ),
			message: "unknown operator".into(),
		};
		assert_eq!( diagnostic.to_string(), "error: b.wat:3:13: unknown operator" );
	}

}
