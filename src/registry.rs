//! The list of projects the host manages during a session.

use std::path::{ Path, PathBuf };
use thiserror::Error ;

use crate::project::Project ;



#[derive( Error, Debug, PartialEq, Eq )]
pub enum RegistryError {
	/// A project with the same root directory is already listed.
	#[error( "That folder is already in the list: {0}" )] AlreadyListed( PathBuf ),
}

/// Projects keyed by their root directory, in insertion order.
#[derive( Debug, Default, Clone )]
pub struct ProjectRegistry {
	projects: Vec<Project>,
}

impl ProjectRegistry {

	pub fn new() -> Self { Self::default() }

	/// Adds a project.
	///
	/// # Errors
	/// Returns [`RegistryError::AlreadyListed`] if a project with the same root exists.
	pub fn add( &mut self, project: Project ) -> Result<&Project, RegistryError> {
		if self.contains( project.root() ) {
			return Err( RegistryError::AlreadyListed( project.root().to_path_buf() ));
		}
		self.projects.push( project );
		Ok( &self.projects[ self.projects.len() - 1 ] )
	}

	/// Removes and returns the project rooted at `root`.
	pub fn remove( &mut self, root: &Path ) -> Option<Project> {
		let index = self.projects.iter().position(| project | project.root() == root )?;
		Some( self.projects.remove( index ))
	}

	pub fn get( &self, root: &Path ) -> Option<&Project> {
		self.projects.iter().find(| project | project.root() == root )
	}

	pub fn get_mut( &mut self, root: &Path ) -> Option<&mut Project> {
		self.projects.iter_mut().find(| project | project.root() == root )
	}

	pub fn contains( &self, root: &Path ) -> bool { self.get( root ).is_some() }

	pub fn iter( &self ) -> impl Iterator<Item = &Project> { self.projects.iter() }

	pub fn len( &self ) -> usize { self.projects.len() }

	pub fn is_empty( &self ) -> bool { self.projects.is_empty() }

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn duplicate_roots_are_rejected() {
		let mut registry = ProjectRegistry::new();
		registry.add( Project::local( "/plugins/a" )).expect( "first add succeeds" );
		assert_eq!(
			registry.add( Project::local( "/plugins/a" )).map(| _ | ()),
			Err( RegistryError::AlreadyListed( PathBuf::from( "/plugins/a" ))),
		);
		assert_eq!( registry.len(), 1 );
	}

	#[test]
	fn removed_projects_are_discarded() {
		let mut registry = ProjectRegistry::new();
		registry.add( Project::local( "/plugins/a" )).expect( "add" );
		registry.add( Project::local( "/plugins/b" )).expect( "add" );

		let removed = registry.remove( Path::new( "/plugins/a" )).expect( "project was listed" );
		assert_eq!( removed.friendly_name(), "a" );
		assert!( !registry.contains( Path::new( "/plugins/a" )));
		assert!( registry.remove( Path::new( "/plugins/a" )).is_none() );
		assert_eq!( registry.iter().map( Project::friendly_name ).collect::<Vec<_>>(), vec![ "b" ]);
	}

}
