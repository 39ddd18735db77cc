use wasm_loader::{ Engine, ModuleCompiler, WasmtimeLoader };

#[test]
fn sources_wrapped_in_a_module_still_compile() {

	let engine = Engine::default();
	let mut loader = WasmtimeLoader::with_engine( &engine );

	let files = vec![
		( "lib.wat".to_string(), "(module (func (export \"f\") (result i32) call $seven))".as_bytes() ),
		( "helper.wat".to_string(), ";; helpers\n(module $helpers\n\t(func $seven (result i32) i32.const 7))\n".as_bytes() ),
	];

	let mut module = match ModuleCompiler::new().compile( files, "wrapped", &mut loader ) {
		Ok( outcome ) => outcome.into_compiled().expect( "Sources were provided" ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
	};

	let plugin = module.module_mut();
	let f = plugin.typed_func::<(), i32>( "f" ).expect( "Export 'f' is missing" );
	assert_eq!( f.call( plugin.store_mut(), () ).expect( "Call failed" ), 7 );

}
