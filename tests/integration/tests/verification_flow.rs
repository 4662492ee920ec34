//! Integration test: DID-anchored JWT verification across crates.
//!
//! Tokens signed by holder keys are checked against DID documents served
//! from the local store and from the self-certifying `did:jwk` / `did:key`
//! methods.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use devcred_crypto::{KeyPair, Secp256k1KeyPair, Signer};
use devcred_identity::{did_jwk, did_key, DidDocument, VerificationMethod};
use devcred_integration_tests::{claims, sign_token, verifier_with};
use devcred_jwt::JwtError;
use serde_json::json;

const DID: &str = "did:example:123";
const KID: &str = "did:example:123#key-1";

fn document_with_method_id(id: &str, holder: &KeyPair) -> DidDocument {
    let mut doc = DidDocument::new(DID);
    doc.verification_method.push(VerificationMethod {
        id: id.to_string(),
        method_type: "JsonWebKey2020".to_string(),
        controller: DID.to_string(),
        public_key_jwk: Some(holder.public_key().to_jwk()),
    });
    doc
}

fn raw_token(header: serde_json::Value, payload: serde_json::Value, signer: &dyn Signer) -> String {
    let input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    );
    let signature = signer.sign(input.as_bytes()).unwrap();
    format!("{}.{}", input, URL_SAFE_NO_PAD.encode(signature))
}

// =========================================================================
// Happy paths
// =========================================================================

#[tokio::test]
async fn test_stored_document_scenario() {
    let holder = KeyPair::generate();
    let payload = claims(json!({"jti": "oauth-code", "iat": 1_700_000_000}));
    let token = sign_token(&holder, KID, &payload);

    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);
    let identity = verifier.verify(&token).await.unwrap();

    assert_eq!(identity.signer_did, DID);
    assert_eq!(identity.payload, payload);
}

#[tokio::test]
async fn test_method_id_forms_are_equivalent() {
    let holder = KeyPair::generate();
    let token = sign_token(&holder, KID, &claims(json!({"jti": "c"})));

    for id in [KID, "key-1", "#key-1"] {
        let verifier = verifier_with(vec![document_with_method_id(id, &holder)]);
        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.signer_did, DID, "method id form {}", id);
    }
}

#[tokio::test]
async fn test_did_jwk_holder() {
    let holder = KeyPair::generate();
    let did = did_jwk(&holder.public_key().to_jwk()).unwrap();
    let token = sign_token(&holder, &format!("{}#0", did), &claims(json!({"jti": "c"})));

    let identity = verifier_with(Vec::new()).verify(&token).await.unwrap();
    assert_eq!(identity.signer_did, did.as_str());
}

#[tokio::test]
async fn test_did_key_holder() {
    let holder = KeyPair::generate();
    let did = did_key(&holder.public_key().to_jwk()).unwrap();
    let kid = format!("{}#{}", did, did.method_specific_id());
    let token = sign_token(&holder, &kid, &claims(json!({"jti": "c"})));

    let identity = verifier_with(Vec::new()).verify(&token).await.unwrap();
    assert_eq!(identity.signer_did, did.as_str());
}

#[tokio::test]
async fn test_secp256k1_did_jwk_and_did_key() {
    let holder = Secp256k1KeyPair::generate();
    let jwk_did = did_jwk(&holder.public_jwk()).unwrap();
    let key_did = did_key(&holder.public_jwk()).unwrap();
    let verifier = verifier_with(Vec::new());

    let token = sign_token(&holder, &format!("{}#0", jwk_did), &claims(json!({"jti": "c"})));
    assert_eq!(
        verifier.verify(&token).await.unwrap().signer_did,
        jwk_did.as_str()
    );

    let kid = format!("{}#{}", key_did, key_did.method_specific_id());
    let token = sign_token(&holder, &kid, &claims(json!({"jti": "c"})));
    assert_eq!(
        verifier.verify(&token).await.unwrap().signer_did,
        key_did.as_str()
    );
}

// =========================================================================
// Rejections
// =========================================================================

#[tokio::test]
async fn test_segment_count() {
    let holder = KeyPair::generate();
    let token = sign_token(&holder, KID, &claims(json!({"jti": "c"})));
    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);

    let parts: Vec<&str> = token.split('.').collect();
    let two = format!("{}.{}", parts[0], parts[1]);
    let four = format!("{}.extra", token);
    for bad in [two.as_str(), four.as_str(), "", "no-dots"] {
        let result = verifier.verify(bad).await;
        assert!(matches!(result, Err(JwtError::MalformedJwt(_))), "{:?}", bad);
    }
}

#[tokio::test]
async fn test_header_missing_alg_or_kid() {
    let holder = KeyPair::generate();
    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);

    let no_kid = raw_token(json!({"typ": "JWT", "alg": "EdDSA"}), json!({}), &holder);
    let no_alg = raw_token(json!({"typ": "JWT", "kid": KID}), json!({}), &holder);
    for token in [no_kid, no_alg] {
        assert!(matches!(
            verifier.verify(&token).await,
            Err(JwtError::MalformedJwt(_))
        ));
    }
}

#[tokio::test]
async fn test_missing_key_is_dereference_failure() {
    let holder = KeyPair::generate();
    let token = sign_token(
        &holder,
        "did:example:123#missing-key",
        &claims(json!({"jti": "c"})),
    );

    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);
    assert!(matches!(
        verifier.verify(&token).await,
        Err(JwtError::DereferenceFailure(_))
    ));
}

#[tokio::test]
async fn test_kid_naming_a_service_is_dereference_failure() {
    let holder = KeyPair::generate();
    let mut doc = document_with_method_id(KID, &holder);
    doc.add_service("hub", "IdentityHub", "https://hub.example.com");
    let token = sign_token(&holder, "did:example:123#hub", &claims(json!({"jti": "c"})));

    assert!(matches!(
        verifier_with(vec![doc]).verify(&token).await,
        Err(JwtError::DereferenceFailure(_))
    ));
}

#[tokio::test]
async fn test_unknown_did_is_resolution_failure() {
    let holder = KeyPair::generate();
    let token = sign_token(&holder, "did:example:999#key-1", &claims(json!({"jti": "c"})));

    assert!(matches!(
        verifier_with(Vec::new()).verify(&token).await,
        Err(JwtError::DidResolutionFailure(_))
    ));
}

#[tokio::test]
async fn test_hs256_is_unsupported_even_when_signature_is_valid() {
    let holder = KeyPair::generate();
    let token = raw_token(
        json!({"typ": "JWT", "alg": "HS256", "kid": KID}),
        json!({"jti": "c"}),
        &holder,
    );

    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);
    assert!(matches!(
        verifier.verify(&token).await,
        Err(JwtError::UnsupportedAlgorithm(_))
    ));
}

#[tokio::test]
async fn test_every_signature_bit_flip_is_rejected() {
    let holder = KeyPair::generate();
    let token = sign_token(&holder, KID, &claims(json!({"jti": "c"})));
    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);

    let (input, sig_b64) = token.rsplit_once('.').unwrap();
    let signature = URL_SAFE_NO_PAD.decode(sig_b64).unwrap();
    for bit in 0..signature.len() * 8 {
        let mut flipped = signature.clone();
        flipped[bit / 8] ^= 1 << (bit % 8);
        let tampered = format!("{}.{}", input, URL_SAFE_NO_PAD.encode(&flipped));
        assert!(
            matches!(
                verifier.verify(&tampered).await,
                Err(JwtError::SignatureMismatch)
            ),
            "bit {} accepted",
            bit
        );
    }
}

#[tokio::test]
async fn test_token_signed_by_another_key() {
    let holder = KeyPair::generate();
    let token = sign_token(&KeyPair::generate(), KID, &claims(json!({"jti": "c"})));

    let verifier = verifier_with(vec![document_with_method_id(KID, &holder)]);
    assert!(matches!(
        verifier.verify(&token).await,
        Err(JwtError::SignatureMismatch)
    ));
}
