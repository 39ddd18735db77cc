use wasm_loader::{ Project, ProjectRegistry, RegistryError };
use crate::project_tree ;

#[test]
fn registry_tracks_projects_by_root() {

	let dir = project_tree(&[
		( "plugin.toml", "name = \"First\"\n" ),
		( "a.wat", "(func $a)" ),
	]);

	let mut registry = ProjectRegistry::new();
	registry.add( Project::local( dir.path() )).expect( "First registration" );

	match registry.add( Project::local( dir.path() )) {
		Err( RegistryError::AlreadyListed( root )) => assert_eq!( root, dir.path() ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
		Ok( _ ) => panic!( "Expected a duplicate" ),
	}

	registry.get_mut( dir.path() )
		.expect( "Registered" )
		.apply_descriptor( &dir.path().join( "plugin.toml" ))
		.expect( "Valid descriptor" );
	assert_eq!( registry.get( dir.path() ).map( Project::friendly_name ), Some( "First" ));

	assert!( registry.remove( dir.path() ).is_some() );
	assert!( registry.is_empty() );

}
