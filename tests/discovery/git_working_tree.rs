use wasm_loader::SourceDiscoverer ;
use crate::{ git, project_tree, relative };

#[test]
fn git_listing_respects_ignore_rules() {

	let dir = project_tree(&[
		( ".gitignore", "ignored.wat\nscratch/\n" ),
		( "tracked.wat", "(func $tracked)" ),
		( "untracked.wat", "(func $untracked)" ),
		( "ignored.wat", "(func $ignored)" ),
		( "scratch/notes.wat", "(func $notes)" ),
		( "bin/out.wat", "(func $out)" ),
		( "deleted.wat", "(func $deleted)" ),
	]);

	if !git( dir.path(), &[ "init", "-q" ]) {
		eprintln!( "git is not available, skipping" );
		return ;
	}
	assert!( git( dir.path(), &[ "add", "tracked.wat", "deleted.wat", ".gitignore" ]));
	std::fs::remove_file( dir.path().join( "deleted.wat" )).expect( "Failed to delete a tracked file" );

	let files = SourceDiscoverer::new().discover( dir.path(), &[] );

	assert_eq!( relative( dir.path(), &files ), vec![ "tracked.wat", "untracked.wat" ]);

}
