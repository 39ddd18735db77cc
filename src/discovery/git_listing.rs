use std::ffi::OsString ;
use std::io::Read ;
use std::path::{ Path, PathBuf, MAIN_SEPARATOR_STR };
use std::process::{ Child, Command, ExitStatus, Stdio };
use std::sync::mpsc::{ self, Receiver, RecvTimeoutError };
use std::time::{ Duration, Instant };

use super::{ DiscoveryError, ListFiles };



const DEFAULT_TIMEOUT: Duration = Duration::from_secs( 30 );
const POLL_INTERVAL: Duration = Duration::from_millis( 10 );

/// Lists the files git considers part of the working tree: everything tracked plus
/// untracked files that aren't ignored.
///
/// Runs `git ls-files --cached --others --exclude-standard` inside the project root.
/// Paths come back relative to the root with `/` separators and are joined onto it.
#[derive( Debug, Clone )]
pub struct GitListing {
	program: OsString,
	timeout: Duration,
}

impl Default for GitListing {
	fn default() -> Self {
		Self { program: OsString::from( "git" ), timeout: DEFAULT_TIMEOUT }
	}
}

impl GitListing {

	/// Uses `program` as the git executable.
	pub fn with_program( mut self, program: impl Into<OsString> ) -> Self {
		self.program = program.into();
		self
	}

	/// Sets how long git may take, from spawning it to its exit, before it is killed.
	pub fn with_timeout( mut self, timeout: Duration ) -> Self {
		self.timeout = timeout ;
		self
	}

	fn program_name( &self ) -> String { self.program.to_string_lossy().into_owned() }

	fn run( &self, root: &Path ) -> Result<( ExitStatus, Vec<u8>, Vec<u8> ), DiscoveryError> {

		let deadline = Instant::now() + self.timeout ;
		let mut child = Command::new( &self.program )
			.args([ "-c", "core.quotePath=false", "ls-files", "--cached", "--others", "--exclude-standard" ])
			.current_dir( root )
			.stdin( Stdio::null() )
			.stdout( Stdio::piped() )
			.stderr( Stdio::piped() )
			.spawn()
			.map_err(| source | DiscoveryError::Spawn { program: self.program_name(), source })?;

		let ( stdout, stderr ) = match self.collect_output( &mut child, deadline ) {
			Ok( output ) => output,
			Err( err ) => {
				let _ = child.kill();
				let _ = child.wait();
				return Err( err );
			},
		};

		let status = self.wait( &mut child, deadline )?;
		Ok(( status, stdout, stderr ))

	}

	/// Drains both pipes at once so neither can fill up and stall git. The readers are
	/// detached: a git that hangs, or leaves a grandchild holding the pipes, is given
	/// up on at the deadline without waiting for them.
	fn collect_output( &self, child: &mut Child, deadline: Instant ) -> Result<( Vec<u8>, Vec<u8> ), DiscoveryError> {
		let thread_failed = | source | DiscoveryError::Io { program: self.program_name(), source };
		let stdout = read_in_background( "git-stdout", child.stdout.take() ).map_err( thread_failed )?;
		let stderr = read_in_background( "git-stderr", child.stderr.take() ).map_err( thread_failed )?;
		Ok(( self.receive( &stdout, deadline )?, self.receive( &stderr, deadline )? ))
	}

	fn receive( &self, output: &Receiver<std::io::Result<Vec<u8>>>, deadline: Instant ) -> Result<Vec<u8>, DiscoveryError> {
		match output.recv_timeout( deadline.saturating_duration_since( Instant::now() )) {
			Ok( Ok( bytes )) => Ok( bytes ),
			Ok( Err( source )) => Err( DiscoveryError::Io { program: self.program_name(), source }),
			Err( RecvTimeoutError::Timeout ) => Err( self.timed_out() ),
			Err( RecvTimeoutError::Disconnected ) => Err( DiscoveryError::Io {
				program: self.program_name(),
				source: std::io::Error::other( "output reader stopped unexpectedly" ),
			}),
		}
	}

	fn wait( &self, child: &mut Child, deadline: Instant ) -> Result<ExitStatus, DiscoveryError> {
		loop {
			match child.try_wait() {
				Ok( Some( status )) => return Ok( status ),
				Ok( None ) if Instant::now() >= deadline => {
					let _ = child.kill();
					let _ = child.wait();
					return Err( self.timed_out() );
				},
				Ok( None ) => std::thread::sleep( POLL_INTERVAL ),
				Err( source ) => return Err( DiscoveryError::Io { program: self.program_name(), source }),
			}
		}
	}

	fn timed_out( &self ) -> DiscoveryError {
		DiscoveryError::TimedOut { program: self.program_name(), timeout: self.timeout }
	}

}

/// Reads `pipe` to the end on its own thread and delivers the result through the receiver.
fn read_in_background<R: Read + Send + 'static>( name: &str, pipe: Option<R> ) -> std::io::Result<Receiver<std::io::Result<Vec<u8>>>> {
	let ( sender, receiver ) = mpsc::channel();
	std::thread::Builder::new()
		.name( name.to_string() )
		.spawn( move || {
			let mut buffer = Vec::new();
			let result = match pipe {
				Some( mut pipe ) => pipe.read_to_end( &mut buffer ).map(|_| buffer ),
				None => Ok( buffer ),
			};
			let _ = sender.send( result );
		})?;
	Ok( receiver )
}

fn parse_listing( root: &Path, listing: &str ) -> Vec<PathBuf> {
	listing.lines()
		.map( str::trim )
		.filter(| line | !line.is_empty() )
		.map(| line | root.join( line.replace( '/', MAIN_SEPARATOR_STR )))
		.collect()
}

impl ListFiles for GitListing {

	fn name( &self ) -> &'static str { "git" }

	fn list( &self, root: &Path ) -> Result<Vec<PathBuf>, DiscoveryError> {

		let ( status, stdout, stderr ) = self.run( root )?;

		if !status.success() {
			let output = [ stdout, stderr ].concat();
			return Err( DiscoveryError::Exit {
				program: self.program_name(),
				status,
				output: String::from_utf8_lossy( &output ).into_owned(),
			});
		}

		let listing = String::from_utf8( stdout )
			.map_err(|_| DiscoveryError::InvalidOutput { program: self.program_name() })?;
		Ok( parse_listing( root, &listing ))

	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn listing_lines_are_trimmed_and_joined_onto_root() {
		let root = Path::new( "/proj" );
		let parsed = parse_listing( root, "a.wat\r\nsub/b.wat\n\n  \nREADME.md\n" );
		assert_eq!( parsed, vec![
			root.join( "a.wat" ),
			root.join( "sub" ).join( "b.wat" ),
			root.join( "README.md" ),
		]);
	}

	#[test]
	fn missing_executable_is_a_spawn_error() {
		let root = tempfile::tempdir().expect( "tempdir" );
		let listing = GitListing::default().with_program( "definitely-not-a-git-executable" );
		assert!( matches!( listing.list( root.path() ), Err( DiscoveryError::Spawn { .. })));
	}

	#[cfg( unix )]
	#[test]
	fn hanging_git_is_killed_at_the_deadline() {
		use std::os::unix::fs::PermissionsExt ;

		let root = tempfile::tempdir().expect( "tempdir" );
		let tools = tempfile::tempdir().expect( "tempdir" );
		let script = tools.path().join( "slow-git" );
		std::fs::write( &script, "#!/bin/sh\nsleep 5\n" ).expect( "write script" );
		std::fs::set_permissions( &script, std::fs::Permissions::from_mode( 0o755 )).expect( "chmod" );

		let listing = GitListing::default()
			.with_program( &script )
			.with_timeout( Duration::from_millis( 100 ));
		let started = Instant::now();
		let result = listing.list( root.path() );

		assert!( matches!( result, Err( DiscoveryError::TimedOut { .. })), "Expected a timeout, got {:?}", result );
		assert!( started.elapsed() < Duration::from_secs( 3 ), "Took {:?}", started.elapsed() );
	}

	#[cfg( unix )]
	#[test]
	fn noisy_stderr_does_not_stall_the_listing() {
		use std::os::unix::fs::PermissionsExt ;

		let root = tempfile::tempdir().expect( "tempdir" );
		let tools = tempfile::tempdir().expect( "tempdir" );
		let script = tools.path().join( "noisy-git" );
		std::fs::write( &script, "#!/bin/sh\nhead -c 1000000 /dev/zero >&2\necho a.wat\n" ).expect( "write script" );
		std::fs::set_permissions( &script, std::fs::Permissions::from_mode( 0o755 )).expect( "chmod" );

		let listing = GitListing::default()
			.with_program( &script )
			.with_timeout( Duration::from_secs( 20 ));

		assert_eq!( listing.list( root.path() ).expect( "listing succeeds" ), vec![ root.path().join( "a.wat" ) ]);
	}

}
