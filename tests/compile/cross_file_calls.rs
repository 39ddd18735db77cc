use wasm_loader::{ Engine, ModuleCompiler, ModuleVersion, WasmtimeLoader };

const HELPER: &str = r#"
(func $helper (result i32)
	i32.const 42)
"# ;

const API: &str = r#"
(func (export "answer") (result i32)
	call $helper)
(global (export "version-major") i32 (i32.const 1))
(global (export "version-minor") i32 (i32.const 2))
(global (export "version-patch") i32 (i32.const 3))
"# ;

#[test]
fn functions_are_shared_across_files() {

	let engine = Engine::default();
	let mut loader = WasmtimeLoader::with_engine( &engine );

	let files = vec![
		( "helper.wat".to_string(), HELPER.as_bytes() ),
		( "api.wat".to_string(), API.as_bytes() ),
	];

	let mut module = match ModuleCompiler::new().compile( files, "cross_file_abcdefgh", &mut loader ) {
		Ok( outcome ) => outcome.into_compiled().expect( "Sources were provided" ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
	};

	assert_eq!( module.name(), "cross_file_abcdefgh" );
	assert_eq!( module.version(), ModuleVersion::new( 1, 2, 3 ));
	assert_eq!( module.sources().first(), "helper.wat" );
	assert_eq!( module.sources().last(), "api.wat" );
	assert!( module.binary().starts_with( b"\0asm" ));

	let plugin = module.module_mut();
	let answer = plugin.typed_func::<(), i32>( "answer" ).expect( "Export 'answer' is missing" );
	assert_eq!( answer.call( plugin.store_mut(), () ).expect( "Call failed" ), 42 );

}
