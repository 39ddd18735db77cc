//! Trust gate for remotely sourced plugin projects.
//!
//! A remote artifact may only be built if its stable identifier or the SHA-256
//! hash of its content appears in one of two allow-lists compiled into this
//! crate. Extending trust requires a new release of the crate; there is no way
//! to add entries at runtime.

use std::collections::HashSet ;
use std::fs::File ;
use std::io::BufReader ;
use std::path::Path ;
use once_cell::sync::Lazy ;
use sha2::{ Digest, Sha256 };



static TRUSTED_IDS: Lazy<HashSet<u64>> = Lazy::new(|| HashSet::from([
	// Workshop
	2_292_390_607, // Tool Switcher
	2_413_859_055, // SteamWorkshopFix
	2_413_918_072, // SEWorldGenPlugin v2
	2_414_532_651, // DecalFixPlugin
	// SEPM, mostly old or broken
	2_004_495_632, // BlockPicker
	1_937_528_740, // GridFilter
	2_029_854_486, // RemovePlanetSizeLimits
	2_171_994_463, // ClientFixes
	2_156_683_844, // SEWorldGenPlugin
	1_937_530_079, // Mass Rename
	2_037_606_896, // CameraLCD
]));

// Lowercase hex SHA-256 of reviewed artifacts.
static TRUSTED_HASHES: Lazy<HashSet<&'static str>> = Lazy::new( HashSet::new );

/// Outcome of validating a remote artifact.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct TrustDecision {
	trusted: bool,
	content_hash: Option<String>,
}

impl TrustDecision {

	/// Whether the artifact may be built and executed.
	#[inline] pub fn is_trusted( &self ) -> bool { self.trusted }

	/// Lowercase hex SHA-256 of the artifact.
	///
	/// Only present when the identifier check failed and the content had to be hashed.
	#[inline] pub fn content_hash( &self ) -> Option<&str> { self.content_hash.as_deref() }

	/// Consumes the decision, returning the hash if one was computed.
	#[inline] pub fn into_content_hash( self ) -> Option<String> { self.content_hash }

}

/// Decides whether a remote artifact is allowed to run.
///
/// The validator is a pure function of its allow-lists and the artifact's bytes.
/// It does no network or persistence I/O and holds no mutable state, so a single
/// instance can be shared freely between concurrent builds.
#[derive( Debug, Clone, Copy )]
pub struct TrustValidator {
	ids: &'static HashSet<u64>,
	hashes: &'static HashSet<&'static str>,
}

impl Default for TrustValidator {
	fn default() -> Self { Self::builtin() }
}

impl TrustValidator {

	/// A validator backed by the allow-lists compiled into this crate.
	pub fn builtin() -> Self {
		Self { ids: &TRUSTED_IDS, hashes: &TRUSTED_HASHES }
	}

	#[cfg( test )]
	fn with_lists( ids: &'static HashSet<u64>, hashes: &'static HashSet<&'static str> ) -> Self {
		Self { ids, hashes }
	}

	/// Validates the artifact named by `stable_id` whose content lives at `artifact`.
	///
	/// A known identifier short-circuits: the file is never opened and no hash is
	/// returned. Otherwise the file is hashed and the hash is always returned, even
	/// when the decision is negative.
	///
	/// # Errors
	/// Returns an error if the identifier is unknown and the artifact cannot be read.
	pub fn validate( &self, stable_id: u64, artifact: &Path ) -> std::io::Result<TrustDecision> {

		if self.ids.contains( &stable_id ) {
			tracing::debug!( stable_id, "artifact trusted by identifier" );
			return Ok( TrustDecision { trusted: true, content_hash: None });
		}

		let hash = content_hash( artifact )?;
		let trusted = self.hashes.contains( hash.as_str() );
		tracing::debug!( stable_id, %hash, trusted, "artifact checked by content hash" );
		Ok( TrustDecision { trusted, content_hash: Some( hash )})

	}

}

/// Streams the file at `path` through SHA-256 and returns the lowercase hex digest.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn content_hash( path: &Path ) -> std::io::Result<String> {
	let mut reader = BufReader::new( File::open( path )? );
	let mut hasher = Sha256::new();
	std::io::copy( &mut reader, &mut hasher )?;
	Ok( hex::encode( hasher.finalize() ))
}

#[cfg( test )]
mod tests {

	use super::* ;
	use std::io::Write ;

	static NO_IDS: Lazy<HashSet<u64>> = Lazy::new( HashSet::new );
	// Digest of content none of these tests write.
	static REVIEWED: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
		"5d0c5ac59d0b8a1a7a1b4f3d2d9d5b2d4b3a3f0d3c6e0b4d0f8a5b3e2c1d0e9f",
	]));

	fn artifact_with( content: &[u8] ) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().expect( "failed to create temp file" );
		file.write_all( content ).expect( "failed to write temp file" );
		file
	}

	#[test]
	fn known_id_skips_hashing_even_for_missing_file() {
		let decision = TrustValidator::builtin()
			.validate( 2_292_390_607, Path::new( "/definitely/not/here.zip" ))
			.expect( "known ids must not touch the file" );
		assert!( decision.is_trusted() );
		assert_eq!( decision.content_hash(), None );
	}

	#[test]
	fn unknown_id_with_unreadable_file_is_an_error() {
		let result = TrustValidator::builtin().validate( 1, Path::new( "/definitely/not/here.zip" ));
		assert!( result.is_err() );
	}

	#[test]
	fn hash_allow_list_grants_trust() {
		let artifact = artifact_with( b"reviewed plugin" );
		let hash = content_hash( artifact.path() ).expect( "hash failed" );

		let leaked: &'static str = Box::leak( hash.clone().into_boxed_str() );
		let allowed: &'static HashSet<&'static str> = Box::leak( Box::new( HashSet::from([ leaked ])));
		let decision = TrustValidator::with_lists( &NO_IDS, allowed )
			.validate( 42, artifact.path() )
			.expect( "validation failed" );

		assert!( decision.is_trusted() );
		assert_eq!( decision.content_hash(), Some( hash.as_str() ));
	}

	#[test]
	fn hash_outside_allow_list_is_untrusted_but_reported() {
		let artifact = artifact_with( b"something else entirely" );
		let decision = TrustValidator::with_lists( &NO_IDS, &REVIEWED )
			.validate( 42, artifact.path() )
			.expect( "validation failed" );

		assert!( !decision.is_trusted() );
		let hash = decision.content_hash().expect( "hash must be reported" );
		assert_eq!( hash.len(), 64 );
		assert!( hash.chars().all(| c | c.is_ascii_hexdigit() && !c.is_ascii_uppercase() ));
	}

	#[test]
	fn empty_file_hashes_to_well_known_digest() {
		let artifact = artifact_with( b"" );
		assert_eq!(
			content_hash( artifact.path() ).expect( "hash failed" ),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
		);
	}

	#[test]
	fn builtin_hash_list_is_empty() {
		assert!( TRUSTED_HASHES.is_empty() );
		assert_eq!( TRUSTED_IDS.len(), 11 );
	}

}
