use sha2::{ Digest, Sha256 };
use wasm_loader::{ content_hash, TrustValidator };
use crate::project_tree ;

const ARTIFACT: &str = "(func (export \"run\"))" ;

#[test]
fn unlisted_artifact_is_refused_and_hashed() {

	let dir = project_tree(&[( "plugin.wat", ARTIFACT )]);
	let artifact = dir.path().join( "plugin.wat" );

	let decision = TrustValidator::builtin()
		.validate( 999_999_999, &artifact )
		.expect( "The artifact is readable" );

	let expected = hex::encode( Sha256::digest( ARTIFACT.as_bytes() ));
	assert!( !decision.is_trusted() );
	assert_eq!( decision.content_hash(), Some( expected.as_str() ));
	assert_eq!( content_hash( &artifact ).expect( "The artifact is readable" ), expected );

}

#[test]
fn unlisted_and_unreadable_artifact_is_an_error() {

	let dir = project_tree(&[]);

	assert!( TrustValidator::default().validate( 999_999_999, &dir.path().join( "gone.zip" )).is_err() );

}
