use std::time::{ Duration, Instant };
use wasm_loader::SourceDiscoverer ;
use crate::{ project_tree, relative };

#[test]
fn missing_git_falls_back_to_scanning() {

	let dir = project_tree(&[
		( "a.wat", "(func $a)" ),
		( "sub/b.wat", "(func $b)" ),
		( "target/c.wat", "(func $c)" ),
	]);

	let with_broken_git = SourceDiscoverer::new()
		.with_git_program( "definitely-not-a-git-executable" )
		.discover( dir.path(), &[] );
	let scanned = SourceDiscoverer::new().without_vcs().discover( dir.path(), &[] );

	assert_eq!( with_broken_git, scanned );
	assert_eq!( relative( dir.path(), &scanned ), vec![ "a.wat", "sub/b.wat" ]);

}

#[cfg( unix )]
#[test]
fn hanging_git_times_out_and_falls_back_to_scanning() {

	use std::os::unix::fs::PermissionsExt ;

	let dir = project_tree(&[
		( "a.wat", "(func $a)" ),
		( "bin/b.wat", "(func $b)" ),
	]);
	let tools = project_tree(&[( "hanging-git", "#!/bin/sh\nsleep 5\n" )]);
	let program = tools.path().join( "hanging-git" );
	std::fs::set_permissions( &program, std::fs::Permissions::from_mode( 0o755 )).expect( "Failed to make the script executable" );

	let started = Instant::now();
	let files = SourceDiscoverer::new()
		.with_git_program( &program )
		.with_git_timeout( Duration::from_millis( 100 ))
		.discover( dir.path(), &[] );
	let elapsed = started.elapsed();

	assert!( elapsed < Duration::from_secs( 3 ), "A 100ms timeout did not bound the wait: took {:?}", elapsed );
	assert_eq!( relative( dir.path(), &files ), vec![ "a.wat" ]);

}
