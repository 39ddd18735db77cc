//! One build of one project: trust gate, discovery, compilation, loading.

use std::fs::File ;
use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use pipe_trait::Pipe ;
use thiserror::Error ;

use crate::compiler::{ unique_module_name, CompileError, CompileOutcome, CompiledModule, ModuleCompiler, SourceUnit };
use crate::discovery::SourceDiscoverer ;
use crate::loader::ModuleLoader ;
use crate::project::{ Origin, Project };
use crate::trust::TrustValidator ;



/// Errors that fail a build. None of them leave a module loaded.
#[derive( Error, Debug )]
pub enum BuildError {
	/// A remote artifact is in neither allow-list. Nothing was discovered or compiled.
	#[error( "Plugin {stable_id} is not trusted (sha256: {content_hash})" )]
	Untrusted { stable_id: u64, content_hash: String },
	/// The remote artifact couldn't be read to compute its hash.
	#[error( "Could not check trust for plugin {stable_id}: {source}" )]
	TrustCheck { stable_id: u64, source: std::io::Error },
	/// A source file couldn't be opened.
	#[error( "IO Error opening '{path}': {source}" )]
	Io { path: PathBuf, source: std::io::Error },
	/// The sources didn't compile or the module didn't load.
	#[error( "Failed to build '{project}': {source}" )]
	Compile { project: String, source: CompileError },
}

impl BuildError {
	/// Whether the build was refused by the trust gate rather than failing to compile.
	pub fn is_trust_failure( &self ) -> bool {
		matches!( self, Self::Untrusted { .. } | Self::TrustCheck { .. })
	}
}

/// Result of a build that didn't fail.
#[derive( Debug )]
pub enum BuildOutcome<M> {
	/// The project has no sources (missing root, or everything filtered out).
	NothingToBuild,
	Built( CompiledModule<M> ),
}

impl<M> BuildOutcome<M> {
	pub fn into_built( self ) -> Option<CompiledModule<M>> {
		match self {
			Self::NothingToBuild => None,
			Self::Built( module ) => Some( module ),
		}
	}
}

/// Builds projects into modules loaded by `L`.
///
/// Every call to [`PluginBuilder::build`] starts from the current disk state; nothing
/// is cached between builds. A failed build leaves earlier modules and the builder
/// untouched, so it can simply be retried.
#[must_use = "call .build() to build a project"]
pub struct PluginBuilder<L: ModuleLoader> {
	loader: L,
	discoverer: SourceDiscoverer,
	compiler: ModuleCompiler,
	validator: TrustValidator,
}

impl<L: ModuleLoader> PluginBuilder<L> {

	/// A builder with the default discoverer and the built-in trust lists.
	pub fn new( loader: L ) -> Self {
		Self {
			loader,
			discoverer: SourceDiscoverer::default(),
			compiler: ModuleCompiler::new(),
			validator: TrustValidator::builtin(),
		}
	}

	/// Replaces the discoverer, e.g. to change the git executable or build output names.
	pub fn with_discoverer( mut self, discoverer: SourceDiscoverer ) -> Self {
		self.discoverer = discoverer ;
		self
	}

	#[inline] pub fn loader( &self ) -> &L { &self.loader }
	#[inline] pub fn loader_mut( &mut self ) -> &mut L { &mut self.loader }

	/// Builds `project` into a loaded module.
	///
	/// Remote projects must pass the trust gate first. Local projects are never checked.
	///
	/// # Errors
	/// Returns [`BuildError::Untrusted`] or [`BuildError::TrustCheck`] if a remote
	/// project is refused, or another [`BuildError`] if its sources can't be compiled.
	pub fn build( &mut self, project: &Project ) -> Result<BuildOutcome<L::Module>, BuildError> {

		if let Origin::Remote { stable_id, artifact } = project.origin() {
			self.check_trust( *stable_id, artifact )?;
		}

		let root = project.root();
		let files = self.discoverer.discover( root, project.allowed_prefixes() );
		if files.is_empty() {
			tracing::info!( project = %project, "no source files found, nothing to build" );
			return Ok( BuildOutcome::NothingToBuild );
		}

		tracing::info!(
			"Compiling files from {}: {}",
			root.display(),
			files.iter().map(| file | display_relative( root, file )).join( ", " )
		);

		let unit = load_sources( project, &files )?;
		let module_name = unique_module_name( project.friendly_name() );

		match self.compiler.compile_unit( unit, &module_name, &mut self.loader ) {
			Ok( CompileOutcome::Compiled( module )) => Ok( BuildOutcome::Built( module )),
			Ok( CompileOutcome::NoSources ) => Ok( BuildOutcome::NothingToBuild ),
			Err( source ) => {
				tracing::warn!( project = %project, error = %source, "build failed" );
				Err( BuildError::Compile { project: project.friendly_name().to_string(), source })
			},
		}

	}

	fn check_trust( &self, stable_id: u64, artifact: &Path ) -> Result<(), BuildError> {
		self.validator.validate( stable_id, artifact )
			.map_err(| source | BuildError::TrustCheck { stable_id, source })?
			.pipe(| decision | match decision.is_trusted() {
				true => Ok(()),
				false => {
					let content_hash = decision.into_content_hash().unwrap_or_default();
					tracing::warn!( stable_id, %content_hash, "refusing to build untrusted plugin" );
					Err( BuildError::Untrusted { stable_id, content_hash })
				},
			})
	}

}

impl<L: ModuleLoader + std::fmt::Debug> std::fmt::Debug for PluginBuilder<L> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "PluginBuilder" )
			.field( "loader", &self.loader )
			.field( "discoverer", &self.discoverer )
			.finish_non_exhaustive()
	}
}

/// Feeds every file into one unit, opening each only while it is being read.
fn load_sources( project: &Project, files: &[PathBuf] ) -> Result<SourceUnit, BuildError> {
	let mut unit = SourceUnit::new();
	for path in files {
		let file = File::open( path ).map_err(| source | BuildError::Io { path: path.clone(), source })?;
		unit.load( display_relative( project.root(), path ), file )
			.map_err(| source | BuildError::Compile { project: project.friendly_name().to_string(), source })?;
	}
	Ok( unit )
}

fn display_relative( root: &Path, path: &Path ) -> String {
	path.strip_prefix( root )
		.unwrap_or( path )
		.components()
		.map(| component | component.as_os_str().to_string_lossy() )
		.join( "/" )
}
