use wasm_loader::{ Engine, ModuleCompiler, CompileError, LoadError, WasmtimeLoader };
use crate::PanickingLoader ;

#[test]
fn syntax_errors_never_reach_the_loader() {

	let files = vec![
		( "a.wat".to_string(), "(func $a)\n".as_bytes() ),
		( "b.wat".to_string(), "(func $b (result i32)\n\ti32.konst 1)\n".as_bytes() ),
	];

	match ModuleCompiler::new().compile( files, "broken", &mut PanickingLoader ) {
		Err( CompileError::Diagnostics { module, diagnostics }) => {
			assert_eq!( module, "broken" );
			let [ diagnostic ] = diagnostics.as_slice() else { panic!( "Expected one diagnostic, got {:?}", diagnostics ) };
			assert_eq!( diagnostic.source.as_deref(), Some( "b.wat" ));
			assert_eq!( diagnostic.line, Some( 2 ));
			assert!( !diagnostic.message.is_empty() );
		},
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}

}

#[test]
fn type_errors_are_rejected_by_the_loader() {

	let engine = Engine::default();
	let mut loader = WasmtimeLoader::with_engine( &engine );
	let files = vec![( "bad.wat".to_string(), "(func (export \"bad\") (result i32)\n\ti64.const 1)".as_bytes() )];

	match ModuleCompiler::new().compile( files, "mistyped", &mut loader ) {
		Err( CompileError::Load( LoadError::InvalidModule( _ ))) => {},
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}

}

#[test]
fn unresolved_imports_fail_instantiation() {

	let engine = Engine::default();
	let mut loader = WasmtimeLoader::with_engine( &engine );
	let files = vec![( "needs_host.wat".to_string(), "(import \"host\" \"log\" (func))".as_bytes() )];

	match ModuleCompiler::new().compile( files, "needs_host", &mut loader ) {
		Err( CompileError::Load( LoadError::InstantiationFailed( _ ))) => {},
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}

}
