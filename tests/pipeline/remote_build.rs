use wasm_loader::{ BuildError, Descriptor, PluginBuilder, Project };
use crate::{ project_tree, PanickingLoader, RecordingLoader };

fn descriptor( id: u64 ) -> Descriptor {
	Descriptor::from_toml( &format!( "name = \"Remote\"\nid = {}\n", id )).expect( "Valid descriptor" )
}

#[test]
fn untrusted_remote_project_is_refused_before_compiling() {

	let dir = project_tree(&[
		( "artifact.zip", "downloaded bytes" ),
		( "src/lib.wat", "(func $lib)" ),
	]);
	let project = Project::remote( descriptor( 999_999_999 ), dir.path(), dir.path().join( "artifact.zip" ))
		.expect( "The descriptor has an id" );

	let mut builder = PluginBuilder::new( PanickingLoader );

	match builder.build( &project ) {
		Err( err @ BuildError::Untrusted { stable_id: 999_999_999, .. }) => {
			assert!( err.is_trust_failure() );
			let BuildError::Untrusted { content_hash, .. } = err else { unreachable!() };
			assert_eq!( content_hash.len(), 64 );
		},
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}

}

#[test]
fn unreadable_remote_artifact_is_a_trust_failure() {

	let dir = project_tree(&[( "src/lib.wat", "(func $lib)" )]);
	let project = Project::remote( descriptor( 999_999_999 ), dir.path(), dir.path().join( "missing.zip" ))
		.expect( "The descriptor has an id" );

	match PluginBuilder::new( PanickingLoader ).build( &project ) {
		Err( err @ BuildError::TrustCheck { .. }) => assert!( err.is_trust_failure() ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected failure" ),
	}

}

#[test]
fn trusted_remote_project_builds() {

	let dir = project_tree(&[( "src/lib.wat", "(func $lib)" )]);
	let project = Project::remote( descriptor( 2_292_390_607 ), dir.path(), dir.path().join( "never-downloaded.zip" ))
		.expect( "The descriptor has an id" );

	let mut builder = PluginBuilder::new( RecordingLoader::default() );
	let module = builder.build( &project )
		.expect( "Listed ids are trusted" )
		.into_built()
		.expect( "The project has sources" );

	assert!( module.name().starts_with( "Remote_" ));

}
