//! Source file discovery.
//!
//! Figures out which files make up a project. Two listing strategies implement
//! [`ListFiles`]: [`GitListing`] asks git for every file it considers part of the
//! working tree (tracked plus untracked-but-not-ignored), and [`ScanListing`]
//! walks the filesystem. Git is tried first; if it fails for any reason the
//! failure is logged and the scan runs instead. Discovery itself never fails.
//!
//! Whatever strategy produced them, candidates pass the same filter:
//!
//! - the extension must mark a compilable source (`.wat` by default),
//! - no directory between the root and the file may be named like build output
//! 	(`bin`, `obj`, `target` by default),
//! - the file must exist (git's index can list deleted files),
//! - when the project restricts its sources, the root-relative path with `/`
//! 	separators must start with one of the allowed prefixes.

mod git_listing ;
mod scan_listing ;
mod source_filter ;

use std::ffi::OsString ;
use std::path::{ Path, PathBuf };
use std::time::Duration ;
use itertools::Itertools ;
use thiserror::Error ;

pub use git_listing::GitListing ;
pub use scan_listing::ScanListing ;
use source_filter::SourceFilter ;



/// Extension of compilable source files.
pub const SOURCE_EXTENSION: &str = "wat" ;

/// Directory names whose contents are never compiled.
pub const BUILD_OUTPUT_DIRS: [&str; 3] = [ "bin", "obj", "target" ];

/// A way of listing the files under a project root.
pub trait ListFiles {

	/// Short name used in log output.
	fn name( &self ) -> &'static str ;

	/// Lists candidate files under `root` as absolute paths.
	///
	/// # Errors
	/// Returns an error if this strategy can't produce a listing for `root`.
	fn list( &self, root: &Path ) -> Result<Vec<PathBuf>, DiscoveryError> ;

}

/// Reasons a listing strategy gave up.
///
/// These are only ever logged: discovery falls back to the next strategy.
#[derive( Error, Debug )]
pub enum DiscoveryError {
	#[error( "Failed to start '{program}': {source}" )]
	Spawn { program: String, source: std::io::Error },
	#[error( "IO Error while reading from '{program}': {source}" )]
	Io { program: String, source: std::io::Error },
	#[error( "'{program}' exited with {status}" )]
	Exit { program: String, status: std::process::ExitStatus, output: String },
	#[error( "'{program}' did not exit within {timeout:?}" )]
	TimedOut { program: String, timeout: Duration },
	#[error( "'{program}' produced output that is not UTF-8" )]
	InvalidOutput { program: String },
}

impl DiscoveryError {
	/// Whatever the tool printed before failing, if anything.
	pub fn tool_output( &self ) -> Option<&str> { match self {
		Self::Exit { output, .. } if !output.trim().is_empty() => Some( output ),
		_ => None,
	}}
}

/// Produces the ordered list of source files that make up a project.
#[derive( Debug, Clone )]
pub struct SourceDiscoverer {
	git: Option<GitListing>,
	scan: ScanListing,
	extension: String,
}

impl Default for SourceDiscoverer {
	fn default() -> Self { Self::new() }
}

impl SourceDiscoverer {

	/// A discoverer that tries `git` first and compiles `.wat` files.
	pub fn new() -> Self {
		Self {
			git: Some( GitListing::default() ),
			scan: ScanListing::default(),
			extension: SOURCE_EXTENSION.to_string(),
		}
	}

	/// Uses `program` as the git executable.
	pub fn with_git_program( mut self, program: impl Into<OsString> ) -> Self {
		self.git = Some( self.git.unwrap_or_default().with_program( program ));
		self
	}

	/// Sets how long git may run, output included, before it is killed and the scan is used.
	pub fn with_git_timeout( mut self, timeout: Duration ) -> Self {
		self.git = Some( self.git.unwrap_or_default().with_timeout( timeout ));
		self
	}

	/// Skips version control and always scans the filesystem.
	pub fn without_vcs( mut self ) -> Self {
		self.git = None ;
		self
	}

	/// Sets the extension (without the dot) of compilable source files.
	pub fn with_extension( mut self, extension: impl Into<String> ) -> Self {
		self.extension = extension.into();
		self
	}

	/// Replaces the directory names treated as build output.
	pub fn with_build_output_dirs( mut self, dirs: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		self.scan = ScanListing::new( dirs );
		self
	}

	/// Lists the compilable files under `root` that pass the prefix filter.
	///
	/// A root that doesn't exist yields no files. The result is sorted, so identical
	/// disk state always yields the same sequence.
	pub fn discover( &self, root: &Path, allowed_prefixes: &[String] ) -> Vec<PathBuf> {

		if !root.is_dir() {
			tracing::debug!( root = %root.display(), "project root does not exist" );
			return Vec::with_capacity( 0 );
		}

		let filter = SourceFilter::new( root, &self.extension, self.scan.build_output_dirs(), allowed_prefixes );

		self.list_candidates( root )
			.into_iter()
			.filter(| path | filter.accepts( path ))
			.sorted()
			.dedup()
			.collect()

	}

	fn strategies( &self ) -> impl Iterator<Item = &dyn ListFiles> {
		self.git.iter()
			.map(| git | git as &dyn ListFiles )
			.chain( std::iter::once( &self.scan as &dyn ListFiles ))
	}

	fn list_candidates( &self, root: &Path ) -> Vec<PathBuf> {
		self.strategies()
			.find_map(| strategy | match strategy.list( root ) {
				Ok( files ) => {
					tracing::debug!( strategy = strategy.name(), candidates = files.len(), root = %root.display(), "listed project files" );
					Some( files )
				},
				Err( err ) => {
					tracing::warn!(
						strategy = strategy.name(),
						root = %root.display(),
						error = %err,
						output = err.tool_output().unwrap_or_default(),
						"an error occurred while listing project files, falling back"
					);
					None
				},
			})
			.unwrap_or_default()
	}

}
