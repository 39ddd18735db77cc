use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use walkdir::{ DirEntry, WalkDir };

use super::{ DiscoveryError, ListFiles, BUILD_OUTPUT_DIRS };



/// Lists files by walking the filesystem, pruning build output directories.
///
/// Symlinked directories are not descended into; symlinked files are listed like
/// any other file, matching what git reports. Entries that can't be read are logged and skipped,
/// so this strategy always produces a listing.
#[derive( Debug, Clone )]
pub struct ScanListing {
	build_output_dirs: Vec<String>,
}

impl Default for ScanListing {
	fn default() -> Self { Self::new( BUILD_OUTPUT_DIRS ) }
}

impl ScanListing {

	pub fn new( build_output_dirs: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		Self { build_output_dirs: build_output_dirs.into_iter().map( Into::into ).collect() }
	}

	/// Directory names that are never descended into.
	#[inline] pub fn build_output_dirs( &self ) -> &[String] { &self.build_output_dirs }

	fn is_pruned( &self, entry: &DirEntry ) -> bool {
		entry.depth() > 0
			&& entry.file_type().is_dir()
			&& self.build_output_dirs.iter().any(| dir | entry.file_name() == dir.as_str() )
	}

}

impl ListFiles for ScanListing {

	fn name( &self ) -> &'static str { "filesystem" }

	fn list( &self, root: &Path ) -> Result<Vec<PathBuf>, DiscoveryError> {

		let ( entries, errors ) = WalkDir::new( root )
			.follow_links( false )
			.sort_by_file_name()
			.into_iter()
			.filter_entry(| entry | !self.is_pruned( entry ))
			.partition_result::<Vec<_>, Vec<_>, _, _>();

		errors.iter().for_each(| err | tracing::warn!( root = %root.display(), error = %err, "skipping unreadable entry" ));

		Ok( entries.into_iter()
			.filter(| entry | entry.file_type().is_file() || ( entry.path_is_symlink() && entry.path().is_file() ))
			.map( DirEntry::into_path )
			.collect()
		)

	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn walk_prunes_build_output_and_keeps_everything_else() {
		let root = tempfile::tempdir().expect( "tempdir" );
		for relative in [ "a.wat", "readme.md", "sub/b.wat", "bin/Debug/c.wat", "target/d.wat" ] {
			let path = root.path().join( relative );
			std::fs::create_dir_all( path.parent().expect( "has parent" )).expect( "mkdir" );
			std::fs::write( path, "" ).expect( "write" );
		}

		let listed = ScanListing::default().list( root.path() ).expect( "scan never fails" );
		let mut relative = listed.iter()
			.map(| path | path.strip_prefix( root.path() ).expect( "under root" ).to_path_buf() )
			.collect::<Vec<_>>();
		relative.sort();

		assert_eq!( relative, vec![
			PathBuf::from( "a.wat" ),
			PathBuf::from( "readme.md" ),
			PathBuf::from( "sub" ).join( "b.wat" ),
		]);
	}

	#[cfg( unix )]
	#[test]
	fn symlinked_files_are_listed() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let shared = tempfile::tempdir().expect( "tempdir" );
		std::fs::write( shared.path().join( "shared.wat" ), "(func $shared)" ).expect( "write" );
		std::fs::create_dir( shared.path().join( "nested" )).expect( "mkdir" );
		std::fs::write( shared.path().join( "nested" ).join( "hidden.wat" ), "" ).expect( "write" );
		std::os::unix::fs::symlink( shared.path().join( "shared.wat" ), root.path().join( "link.wat" )).expect( "symlink" );
		std::os::unix::fs::symlink( shared.path().join( "nested" ), root.path().join( "nested" )).expect( "symlink" );
		std::os::unix::fs::symlink( root.path().join( "gone.wat" ), root.path().join( "dangling.wat" )).expect( "symlink" );

		let listed = ScanListing::default().list( root.path() ).expect( "scan never fails" );

		assert_eq!( listed, vec![ root.path().join( "link.wat" ) ]);
	}

}
