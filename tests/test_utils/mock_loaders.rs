/// A module handle that declares a fixed version.
#[allow( dead_code )]
#[derive( Debug )]
struct FixedVersion( wasm_loader::ModuleVersion );

impl wasm_loader::LoadedModule for FixedVersion {
	fn declared_version( &mut self ) -> Result<wasm_loader::ModuleVersion, wasm_loader::LoadError> { Ok( self.0 ) }
}

/// Fails the test if anything reaches the loader.
#[allow( dead_code )]
#[derive( Debug )]
struct PanickingLoader ;

impl wasm_loader::ModuleLoader for PanickingLoader {
	type Module = FixedVersion ;
	fn load( &mut self, name: &str, _: &[u8] ) -> Result<Self::Module, wasm_loader::LoadError> {
		panic!( "Loader called for '{}'", name )
	}
}

/// Accepts every binary and remembers the names it was asked to load.
#[allow( dead_code )]
#[derive( Debug, Default )]
struct RecordingLoader { loaded: Vec<String> }

impl wasm_loader::ModuleLoader for RecordingLoader {
	type Module = FixedVersion ;
	fn load( &mut self, name: &str, _: &[u8] ) -> Result<Self::Module, wasm_loader::LoadError> {
		self.loaded.push( name.to_string() );
		Ok( FixedVersion( wasm_loader::ModuleVersion::new( 1, 0, 0 )))
	}
}
