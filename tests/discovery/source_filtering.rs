use wasm_loader::SourceDiscoverer ;
use crate::{ project_tree, relative };

fn fixture() -> tempfile::TempDir {
	project_tree(&[
		( "a.wat", "(func $a)" ),
		( "sub/b.wat", "(func $b)" ),
		( "bin/Debug/c.wat", "(func $c)" ),
		( "obj/d.wat", "(func $d)" ),
		( "notes.txt", "not a source" ),
		( "sub/readme.md", "# not a source" ),
	])
}

#[test]
fn build_output_and_other_extensions_are_skipped() {

	let dir = fixture();
	let files = SourceDiscoverer::new().without_vcs().discover( dir.path(), &[] );

	assert_eq!( relative( dir.path(), &files ), vec![ "a.wat", "sub/b.wat" ]);

}

#[test]
fn allowed_prefixes_restrict_the_build() {

	let dir = fixture();
	let files = SourceDiscoverer::new().without_vcs().discover( dir.path(), &[ "sub/".to_string() ]);

	assert_eq!( relative( dir.path(), &files ), vec![ "sub/b.wat" ]);

}

#[test]
fn backslash_prefixes_match_forward_slash_paths() {

	let dir = fixture();
	let files = SourceDiscoverer::new().without_vcs().discover( dir.path(), &[ "sub\\".to_string() ]);

	assert_eq!( relative( dir.path(), &files ), vec![ "sub/b.wat" ]);

}

#[test]
fn prefixes_are_plain_string_prefixes() {

	let dir = project_tree(&[
		( "sub/b.wat", "(func $b)" ),
		( "subtle/e.wat", "(func $e)" ),
	]);
	let files = SourceDiscoverer::new().without_vcs().discover( dir.path(), &[ "sub".to_string() ]);

	assert_eq!( relative( dir.path(), &files ), vec![ "sub/b.wat", "subtle/e.wat" ]);

}

#[test]
fn custom_extension_and_build_dirs() {

	let dir = project_tree(&[
		( "a.wast", "" ),
		( "a.wat", "" ),
		( "out/b.wast", "" ),
		( "bin/c.wast", "" ),
	]);
	let files = SourceDiscoverer::new()
		.without_vcs()
		.with_extension( "wast" )
		.with_build_output_dirs([ "out" ])
		.discover( dir.path(), &[] );

	assert_eq!( relative( dir.path(), &files ), vec![ "a.wast", "bin/c.wast" ]);

}

#[test]
fn missing_root_yields_nothing() {

	let dir = fixture();
	let files = SourceDiscoverer::new().discover( &dir.path().join( "does-not-exist" ), &[] );

	assert!( files.is_empty(), "Expected no files, found {:?}", files );

}

#[test]
fn discovery_is_deterministic() {

	let dir = fixture();
	let discoverer = SourceDiscoverer::new().without_vcs();

	assert_eq!( discoverer.discover( dir.path(), &[] ), discoverer.discover( dir.path(), &[] ));

}
