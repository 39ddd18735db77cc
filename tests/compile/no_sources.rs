use wasm_loader::{ ModuleCompiler, CompileOutcome };
use crate::PanickingLoader ;

#[test]
fn empty_input_is_not_compiled() {

	let files: Vec<( String, &[u8] )> = Vec::new();

	match ModuleCompiler::new().compile( files, "empty", &mut PanickingLoader ) {
		Ok( CompileOutcome::NoSources ) => {},
		Ok( CompileOutcome::Compiled( module )) => panic!( "Expected no output, compiled '{}'", module.name() ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
	}

}
