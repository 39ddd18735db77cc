use wasm_loader::{ Engine, ModuleCompiler, ModuleVersion, CompileError, LoadError, WasmtimeLoader };

fn compile( source: &str ) -> Result<ModuleVersion, CompileError> {
	let engine = Engine::default();
	let mut loader = WasmtimeLoader::with_engine( &engine );
	let files = vec![( "lib.wat".to_string(), source.as_bytes() )];
	ModuleCompiler::new().compile( files, "versioned", &mut loader )
		.map(| outcome | outcome.into_compiled().expect( "Sources were provided" ).version() )
}

#[test]
fn unversioned_module_is_zero() {
	assert_eq!( compile( "(func $noop)" ).expect( "Compilation failed" ), ModuleVersion::new( 0, 0, 0 ));
}

#[test]
fn partial_version_defaults_the_rest() {
	let version = compile( r#"(global (export "version-minor") i32 (i32.const 4))"# ).expect( "Compilation failed" );
	assert_eq!( version, ModuleVersion::new( 0, 4, 0 ));
	assert_eq!( version.to_string(), "0.4.0" );
}

#[test]
fn mutable_version_is_malformed() {
	match compile( r#"(global (export "version-major") (mut i32) (i32.const 1))"# ) {
		Err( CompileError::Load( LoadError::MalformedVersion { export, .. })) => assert_eq!( export, "version-major" ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( version ) => panic!( "Expected failure, got {}", version ),
	}
}
