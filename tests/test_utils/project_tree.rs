/// Creates a temporary project holding `files`, given as `( relative path, content )`.
#[allow( dead_code )]
fn project_tree( files: &[( &str, &str )] ) -> tempfile::TempDir {
	let _ = tracing_subscriber::fmt()
		.with_env_filter( tracing_subscriber::EnvFilter::from_default_env() )
		.with_test_writer()
		.try_init();
	let dir = tempfile::tempdir().expect( "Failed to create a temporary directory" );
	for ( path, content ) in files {
		let path = dir.path().join( path );
		if let Some( parent ) = path.parent() {
			std::fs::create_dir_all( parent ).expect( "Failed to create a project directory" );
		}
		std::fs::write( path, content ).expect( "Failed to write a project file" );
	}
	dir
}

/// Paths relative to `root`, `/`-separated.
#[allow( dead_code )]
fn relative( root: &std::path::Path, files: &[std::path::PathBuf] ) -> Vec<String> {
	files.iter()
		.map(| file | file.strip_prefix( root ).expect( "Discovered a file outside the root" ))
		.map(| path | path.components().map(| c | c.as_os_str().to_string_lossy().into_owned() ).collect::<Vec<_>>().join( "/" ))
		.collect()
}

/// Runs git in `root`, returning whether it succeeded. `false` also when git isn't installed.
#[allow( dead_code )]
fn git( root: &std::path::Path, args: &[&str] ) -> bool {
	std::process::Command::new( "git" )
		.args( args )
		.current_dir( root )
		.stdout( std::process::Stdio::null() )
		.stderr( std::process::Stdio::null() )
		.status()
		.is_ok_and(| status | status.success() )
}
