//! Project descriptor documents.
//!
//! A descriptor is a small TOML file that names a plugin and optionally restricts
//! which parts of its source tree are compiled:
//!
//! ```toml
//! name = "Tool Switcher"
//! id = 2292390607
//! author = "someone"
//! source_directories = [ "src/", "shared/" ]
//! ```
//!
//! Only `name` is required. The build pipeline consumes `name`, `id` and
//! `source_directories`; the remaining fields are carried for whoever displays them.

use std::path::{ Path, PathBuf };
use serde::Deserialize ;
use thiserror::Error ;



/// A parsed project descriptor.
#[derive( Debug, Clone, Default, PartialEq, Eq, Deserialize )]
pub struct Descriptor {
	/// Display name of the plugin.
	pub name: String,
	/// Stable identifier of the remote source listing, if the plugin has one.
	#[serde( default )]
	pub id: Option<u64>,
	#[serde( default )]
	pub author: Option<String>,
	#[serde( default )]
	pub description: Option<String>,
	#[serde( default )]
	pub tooltip: Option<String>,
	/// Root-relative path prefixes the build is restricted to. Empty means no restriction.
	#[serde( default )]
	pub source_directories: Vec<String>,
}

/// Errors that can occur while reading a descriptor.
#[derive( Error, Debug )]
pub enum DescriptorError {
	#[error( "IO Error reading '{path}': {source}" )]
	Io { path: PathBuf, source: std::io::Error },
	#[error( "Invalid descriptor '{path}': {source}" )]
	Parse { path: PathBuf, source: toml::de::Error },
	#[error( "Descriptor '{0}' has no stable id, which remote plugins require" )]
	MissingId( String ),
}

impl Descriptor {

	/// Parses a descriptor from TOML text.
	///
	/// # Errors
	/// Returns the TOML error if the document is malformed or lacks a `name`.
	pub fn from_toml( text: &str ) -> Result<Self, toml::de::Error> {
		toml::from_str( text )
	}

	/// Reads and parses the descriptor at `path`.
	///
	/// # Errors
	/// Returns an error if the file can't be read or doesn't parse.
	pub fn from_file( path: &Path ) -> Result<Self, DescriptorError> {
		let text = std::fs::read_to_string( path )
			.map_err(| source | DescriptorError::Io { path: path.to_path_buf(), source })?;
		Self::from_toml( &text )
			.map_err(| source | DescriptorError::Parse { path: path.to_path_buf(), source })
	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn full_descriptor_parses() {
		let descriptor = Descriptor::from_toml( r#"
			name = "Tool Switcher"
			id = 2292390607
			author = "avaness"
			description = "Switches tools"
			tooltip = "Tools!"
			source_directories = [ "src/", "shared/" ]
			unknown_field = true
		"# ).expect( "descriptor should parse" );

		assert_eq!( descriptor.name, "Tool Switcher" );
		assert_eq!( descriptor.id, Some( 2_292_390_607 ));
		assert_eq!( descriptor.author.as_deref(), Some( "avaness" ));
		assert_eq!( descriptor.source_directories, vec![ "src/", "shared/" ]);
	}

	#[test]
	fn only_name_is_required() {
		let descriptor = Descriptor::from_toml( r#"name = "Minimal""# ).expect( "descriptor should parse" );
		assert_eq!( descriptor, Descriptor { name: "Minimal".into(), ..Descriptor::default() });
	}

	#[test]
	fn missing_name_is_rejected() {
		assert!( Descriptor::from_toml( r#"author = "nobody""# ).is_err() );
	}

	#[test]
	fn missing_file_reports_io_error() {
		match Descriptor::from_file( Path::new( "/definitely/not/here.toml" )) {
			Err( DescriptorError::Io { .. }) => {}
			other => panic!( "Expected Io error, got: {:?}", other ),
		}
	}

}
