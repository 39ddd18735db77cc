//! The boundary between the build pipeline and whatever hosts the built modules.
//!
//! The pipeline never executes anything itself. It hands the binary it produced to
//! a [`ModuleLoader`], and reads the module's version back from the handle the
//! loader returns. [`WasmtimeLoader`]( crate::WasmtimeLoader ) is the default
//! implementation.

use thiserror::Error ;



/// Loads binary modules into the running process.
pub trait ModuleLoader {

	/// Handle to a module that has been loaded successfully.
	type Module: LoadedModule ;

	/// Loads `binary` under the process-unique `name`.
	///
	/// # Errors
	/// Returns an error if the binary is rejected. A rejected binary must leave
	/// nothing behind in the host.
	fn load( &mut self, name: &str, binary: &[u8] ) -> Result<Self::Module, LoadError> ;

}

/// A module living in the host's module space.
pub trait LoadedModule {

	/// Reads the version the module declares about itself.
	///
	/// # Errors
	/// Returns an error if the module's version metadata is malformed.
	fn declared_version( &mut self ) -> Result<ModuleVersion, LoadError> ;

}

/// Semantic version declared by a loaded module.
///
/// Modules that don't declare a version read back as `0.0.0`.
#[derive( Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash )]
pub struct ModuleVersion {
	pub major: u32,
	pub minor: u32,
	pub patch: u32,
}

impl ModuleVersion {
	pub const fn new( major: u32, minor: u32, patch: u32 ) -> Self {
		Self { major, minor, patch }
	}
}

impl std::fmt::Display for ModuleVersion {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}.{}.{}", self.major, self.minor, self.patch )
	}
}

/// Errors raised by a [`ModuleLoader`] or while reading a [`LoadedModule`]'s metadata.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The host rejected the binary (validation or native compilation failed).
	#[error( "Invalid Module: {0}" )] InvalidModule( String ),
	/// The module compiled but could not be instantiated (missing imports, start trap).
	#[error( "Instantiation Failed: {0}" )] InstantiationFailed( String ),
	/// A version export exists but isn't a non-negative `i32` global.
	#[error( "Malformed Version Export '{export}': {reason}" )] MalformedVersion { export: String, reason: String },
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn version_displays_as_dotted_triple() {
		assert_eq!( ModuleVersion::new( 1, 20, 3 ).to_string(), "1.20.3" );
		assert_eq!( ModuleVersion::default().to_string(), "0.0.0" );
	}

	#[test]
	fn versions_order_numerically() {
		assert!( ModuleVersion::new( 1, 10, 0 ) > ModuleVersion::new( 1, 9, 9 ));
		assert!( ModuleVersion::new( 2, 0, 0 ) > ModuleVersion::new( 1, 99, 99 ));
	}

}
