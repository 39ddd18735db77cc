use std::ffi::OsStr ;
use std::path::{ Component, Path };
use itertools::Itertools ;



/// Decides which listed files are compiled.
pub(super) struct SourceFilter<'a> {
	root: &'a Path,
	extension: &'a str,
	build_output_dirs: &'a [String],
	allowed_prefixes: Vec<String>,
}

impl<'a> SourceFilter<'a> {

	pub fn new(
		root: &'a Path,
		extension: &'a str,
		build_output_dirs: &'a [String],
		allowed_prefixes: &[String],
	) -> Self {
		Self {
			root,
			extension,
			build_output_dirs,
			allowed_prefixes: allowed_prefixes.iter().map(| prefix | prefix.replace( '\\', "/" )).collect(),
		}
	}

	pub fn accepts( &self, path: &Path ) -> bool {

		if path.extension() != Some( OsStr::new( self.extension )) { return false }

		let Ok( relative ) = path.strip_prefix( self.root ) else { return false };
		if self.in_build_output( relative ) { return false }
		if !self.is_allowed( relative ) { return false }

		path.is_file()

	}

	fn in_build_output( &self, relative: &Path ) -> bool {
		relative.parent()
			.into_iter()
			.flat_map( Path::components )
			.any(| component | match component {
				Component::Normal( name ) => self.build_output_dirs.iter().any(| dir | OsStr::new( dir ) == name ),
				_ => false,
			})
	}

	fn is_allowed( &self, relative: &Path ) -> bool {
		if self.allowed_prefixes.is_empty() { return true }
		let relative = relative.components()
			.map(| component | component.as_os_str().to_string_lossy() )
			.join( "/" );
		self.allowed_prefixes.iter().any(| prefix | relative.starts_with( prefix.as_str() ))
	}

}

#[cfg( test )]
mod tests {

	use super::* ;
	use std::path::PathBuf ;

	fn touch( root: &Path, relative: &str ) -> PathBuf {
		let path = root.join( relative );
		std::fs::create_dir_all( path.parent().expect( "has parent" )).expect( "failed to create dirs" );
		std::fs::write( &path, "" ).expect( "failed to write file" );
		path
	}

	fn dirs() -> Vec<String> { vec![ "bin".into(), "obj".into() ] }

	#[test]
	fn rejects_wrong_extension() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let path = touch( root.path(), "notes.txt" );
		let dirs = dirs();
		assert!( !SourceFilter::new( root.path(), "wat", &dirs, &[] ).accepts( &path ));
	}

	#[test]
	fn rejects_build_output_at_any_depth() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let shallow = touch( root.path(), "bin/a.wat" );
		let deep = touch( root.path(), "sub/obj/Release/b.wat" );
		let dirs = dirs();
		let filter = SourceFilter::new( root.path(), "wat", &dirs, &[] );
		assert!( !filter.accepts( &shallow ));
		assert!( !filter.accepts( &deep ));
	}

	#[test]
	fn build_output_names_above_the_root_do_not_count() {
		let outer = tempfile::tempdir().expect( "tempdir" );
		let root = outer.path().join( "bin" ).join( "project" );
		let path = touch( &root, "a.wat" );
		let dirs = dirs();
		assert!( SourceFilter::new( &root, "wat", &dirs, &[] ).accepts( &path ));
	}

	#[test]
	fn file_named_like_build_output_is_kept() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let path = touch( root.path(), "src/obj.wat" );
		let dirs = dirs();
		assert!( SourceFilter::new( root.path(), "wat", &dirs, &[] ).accepts( &path ));
	}

	#[test]
	fn prefixes_are_plain_string_prefixes() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let sub = touch( root.path(), "sub/b.wat" );
		let subway = touch( root.path(), "subway/c.wat" );
		let top = touch( root.path(), "a.wat" );
		let dirs = dirs();

		let slash = SourceFilter::new( root.path(), "wat", &dirs, &[ "sub/".into() ]);
		assert!( slash.accepts( &sub ));
		assert!( !slash.accepts( &subway ));
		assert!( !slash.accepts( &top ));

		let bare = SourceFilter::new( root.path(), "wat", &dirs, &[ "sub".into() ]);
		assert!( bare.accepts( &sub ));
		assert!( bare.accepts( &subway ));
	}

	#[test]
	fn backslash_prefixes_are_normalised() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let nested = touch( root.path(), "src/core/a.wat" );
		let dirs = dirs();
		assert!( SourceFilter::new( root.path(), "wat", &dirs, &[ "src\\core\\".into() ]).accepts( &nested ));
	}

	#[test]
	fn missing_files_are_rejected() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let dirs = dirs();
		assert!( !SourceFilter::new( root.path(), "wat", &dirs, &[] ).accepts( &root.path().join( "deleted.wat" )));
	}

}
