use wasm_loader::{ BuildError, CompileError, PluginBuilder, Project };
use crate::{ project_tree, RecordingLoader };

#[test]
fn failed_build_can_be_retried_after_a_fix() {

	let dir = project_tree(&[
		( "a.wat", "(func $a)" ),
		( "b.wat", "(func $b (" ),
	]);
	let project = Project::local( dir.path() );
	let mut builder = PluginBuilder::new( RecordingLoader::default() );

	match builder.build( &project ) {
		Err( err @ BuildError::Compile { source: CompileError::Diagnostics { .. }, .. }) => assert!( !err.is_trust_failure() ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}
	assert!( builder.loader().loaded.is_empty() );

	std::fs::write( dir.path().join( "b.wat" ), "(func $b)" ).expect( "Failed to fix the source" );

	let module = builder.build( &project )
		.expect( "The fixed project compiles" )
		.into_built()
		.expect( "The project has sources" );
	assert_eq!( module.sources().last(), "b.wat" );
	assert_eq!( builder.loader().loaded.len(), 1 );

}
