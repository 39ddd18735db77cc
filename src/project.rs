//! Buildable plugin projects.
//!
//! A [`Project`] is a directory of sources plus what is known about it: a display
//! name, the subtrees the build is restricted to, and where it came from. Local
//! projects are folders the user picked; remote projects were downloaded into a
//! cache and must pass the trust gate before they are built.

use std::path::{ Path, PathBuf };

use crate::descriptor::{ Descriptor, DescriptorError };



/// Where a project's sources came from.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Origin {
	/// A folder the user selected. Never trust-checked.
	Local,
	/// A downloaded artifact identified by its stable id.
	Remote {
		stable_id: u64,
		/// The downloaded artifact the trust decision is made on.
		artifact: PathBuf,
	},
}

/// Display metadata that the build ignores.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct ProjectMetadata {
	pub author: Option<String>,
	pub description: Option<String>,
	pub tooltip: Option<String>,
}

/// One buildable project.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Project {
	root: PathBuf,
	allowed_prefixes: Vec<String>,
	friendly_name: String,
	origin: Origin,
	metadata: ProjectMetadata,
	descriptor_path: Option<PathBuf>,
}

impl Project {

	/// A project for a folder the user selected, named after the folder.
	pub fn local( root: impl Into<PathBuf> ) -> Self {
		let root = root.into();
		Self {
			friendly_name: leaf_name( &root ),
			root,
			allowed_prefixes: Vec::with_capacity( 0 ),
			origin: Origin::Local,
			metadata: ProjectMetadata::default(),
			descriptor_path: None,
		}
	}

	/// A local project described by the descriptor at `descriptor`.
	///
	/// A descriptor that can't be read leaves the project as [`Project::local`] would
	/// create it; the failure is logged.
	pub fn local_with_descriptor( root: impl Into<PathBuf>, descriptor: &Path ) -> Self {
		let mut project = Self::local( root );
		let _ = project.apply_descriptor( descriptor );
		project
	}

	/// A remote project whose sources were unpacked into `cache_dir`.
	///
	/// # Errors
	/// Returns [`DescriptorError::MissingId`] if the descriptor has no stable id.
	pub fn remote(
		descriptor: Descriptor,
		cache_dir: impl Into<PathBuf>,
		artifact: impl Into<PathBuf>,
	) -> Result<Self, DescriptorError> {
		let stable_id = descriptor.id.ok_or_else(|| DescriptorError::MissingId( descriptor.name.clone() ))?;
		let mut project = Self::local( cache_dir );
		project.origin = Origin::Remote { stable_id, artifact: artifact.into() };
		project.set_from_descriptor( descriptor );
		Ok( project )
	}

	/// Replaces the display metadata and source filter with those of the descriptor at `path`.
	///
	/// The file is parsed completely before anything changes, so a malformed
	/// descriptor leaves the project exactly as it was. A file that doesn't exist
	/// is ignored.
	///
	/// # Errors
	/// Returns an error if the file exists but can't be read or parsed.
	pub fn apply_descriptor( &mut self, path: &Path ) -> Result<(), DescriptorError> {

		if !path.is_file() {
			tracing::debug!( path = %path.display(), "descriptor file not found, keeping current metadata" );
			return Ok(());
		}

		match Descriptor::from_file( path ) {
			Ok( descriptor ) => {
				self.set_from_descriptor( descriptor );
				self.descriptor_path = Some( path.to_path_buf() );
				Ok(())
			},
			Err( err ) => {
				tracing::warn!( project = %self.root.display(), error = %err, "error while reading the descriptor" );
				Err( err )
			},
		}

	}

	fn set_from_descriptor( &mut self, descriptor: Descriptor ) {
		self.friendly_name = descriptor.name ;
		self.allowed_prefixes = descriptor.source_directories ;
		self.metadata = ProjectMetadata {
			author: descriptor.author,
			description: descriptor.description,
			tooltip: descriptor.tooltip,
		};
	}

	/// Directory holding the project's sources.
	#[inline] pub fn root( &self ) -> &Path { &self.root }

	/// Root-relative prefixes the build is restricted to. Empty means everything.
	#[inline] pub fn allowed_prefixes( &self ) -> &[String] { &self.allowed_prefixes }

	#[inline] pub fn friendly_name( &self ) -> &str { &self.friendly_name }

	#[inline] pub fn origin( &self ) -> &Origin { &self.origin }

	#[inline] pub fn metadata( &self ) -> &ProjectMetadata { &self.metadata }

	/// The descriptor most recently applied, if any.
	#[inline] pub fn descriptor_path( &self ) -> Option<&Path> { self.descriptor_path.as_deref() }

	/// Whether the project has to pass the trust gate before it is built.
	#[inline] pub fn is_remote( &self ) -> bool { matches!( self.origin, Origin::Remote { .. }) }

}

impl std::fmt::Display for Project {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}", self.root.display() )
	}
}

fn leaf_name( root: &Path ) -> String {
	root.file_name()
		.map_or_else(|| root.display().to_string(), | name | name.to_string_lossy().into_owned() )
}

#[cfg( test )]
mod tests {

	use super::* ;

	fn write_descriptor( dir: &tempfile::TempDir, text: &str ) -> PathBuf {
		let path = dir.path().join( "plugin.toml" );
		std::fs::write( &path, text ).expect( "failed to write descriptor" );
		path
	}

	#[test]
	fn local_project_is_named_after_its_folder() {
		let project = Project::local( "/home/user/plugins/ToolSwitcher" );
		assert_eq!( project.friendly_name(), "ToolSwitcher" );
		assert!( project.allowed_prefixes().is_empty() );
		assert!( !project.is_remote() );
	}

	#[test]
	fn descriptor_overrides_name_and_filter() {
		let dir = tempfile::tempdir().expect( "failed to create temp dir" );
		let path = write_descriptor( &dir, r#"
			name = "Tool Switcher"
			tooltip = "Switch tools"
			source_directories = [ "src/" ]
		"# );

		let project = Project::local_with_descriptor( dir.path(), &path );
		assert_eq!( project.friendly_name(), "Tool Switcher" );
		assert_eq!( project.allowed_prefixes(), [ "src/".to_string() ]);
		assert_eq!( project.metadata().tooltip.as_deref(), Some( "Switch tools" ));
		assert_eq!( project.descriptor_path(), Some( path.as_path() ));
	}

	#[test]
	fn malformed_descriptor_leaves_project_untouched() {
		let dir = tempfile::tempdir().expect( "failed to create temp dir" );
		let good = write_descriptor( &dir, "name = \"Good\"\nsource_directories = [ \"a/\" ]" );
		let mut project = Project::local_with_descriptor( dir.path(), &good );
		let before = project.clone();

		let bad = dir.path().join( "bad.toml" );
		std::fs::write( &bad, "name = [ unterminated" ).expect( "failed to write descriptor" );

		assert!( matches!( project.apply_descriptor( &bad ), Err( DescriptorError::Parse { .. })));
		assert_eq!( project, before );
	}

	#[test]
	fn missing_descriptor_is_ignored() {
		let mut project = Project::local( "/tmp/SomePlugin" );
		let before = project.clone();
		project.apply_descriptor( Path::new( "/definitely/not/here.toml" )).expect( "missing file is not an error" );
		assert_eq!( project, before );
	}

	#[test]
	fn remote_project_requires_stable_id() {
		let descriptor = Descriptor { name: "Anonymous".into(), ..Descriptor::default() };
		assert!( matches!(
			Project::remote( descriptor, "/cache/anon", "/cache/anon.zip" ),
			Err( DescriptorError::MissingId( name )) if name == "Anonymous"
		));
	}

	#[test]
	fn remote_project_carries_origin() {
		let descriptor = Descriptor {
			name: "Tool Switcher".into(),
			id: Some( 2_292_390_607 ),
			source_directories: vec![ "src/".into() ],
			..Descriptor::default()
		};
		let project = Project::remote( descriptor, "/cache/2292390607", "/cache/2292390607.zip" ).expect( "remote project" );
		assert!( project.is_remote() );
		assert_eq!( project.root(), Path::new( "/cache/2292390607" ));
		assert_eq!( project.friendly_name(), "Tool Switcher" );
		assert_eq!( project.origin(), &Origin::Remote {
			stable_id: 2_292_390_607,
			artifact: PathBuf::from( "/cache/2292390607.zip" ),
		});
	}

}
