//! Integration test: token → verification → issuance → proof check.
//!
//! The holder presents a DID-anchored token carrying an authorization code;
//! the issuer verifies it, looks up the login, and signs a credential that
//! a relying party checks against the issuer's resolved `did:jwk` key.

use std::sync::Arc;

use chrono::Duration;
use devcred_credentials::{CredentialError, CredentialIssuer, VerifiableCredential};
use devcred_crypto::{AlgorithmRegistry, Jwk, KeyPair};
use devcred_identity::{did_jwk, Resource};
use devcred_integration_tests::{
    claims, resolver_with, sign_token, verifier_with, FixedLogin, GOOD_CODE,
};
use serde_json::json;

struct Issuer {
    issuer: CredentialIssuer,
    did: String,
}

fn did_jwk_issuer() -> Issuer {
    let kp = KeyPair::generate();
    let did = did_jwk(&kp.public_key().to_jwk()).unwrap().to_string();
    let issuer = CredentialIssuer::new(
        did.clone(),
        format!("{}#0", did),
        Arc::new(kp),
        Arc::new(FixedLogin("octocat")),
    )
    .with_credential_type("TBDeveloperCredential");
    Issuer { issuer, did }
}

async fn holder_presents(code: &str) -> (String, devcred_jwt::VerifiedIdentity) {
    let holder = KeyPair::generate();
    let holder_did = did_jwk(&holder.public_key().to_jwk()).unwrap().to_string();
    let token = sign_token(
        &holder,
        &format!("{}#0", holder_did),
        &claims(json!({"jti": code, "iat": 1_700_000_000, "iss": holder_did})),
    );
    let identity = verifier_with(Vec::new()).verify(&token).await.unwrap();
    (holder_did, identity)
}

/// What a relying party does: dereference the proof's verification method
/// and check the proof against its key.
async fn relying_party_check(vc: &VerifiableCredential) -> Result<(), CredentialError> {
    let proof = vc.proof.as_ref().expect("credential is signed");
    let jwk: Jwk = match resolver_with(Vec::new())
        .dereference(&proof.verification_method)
        .await
        .unwrap()
    {
        Resource::VerificationMethod(vm) => vm.public_key_jwk.unwrap(),
        other => panic!("proof names a {}", other.kind()),
    };
    vc.verify_proof(&jwk, &AlgorithmRegistry::new())
}

#[tokio::test]
async fn test_full_issuance_flow() {
    let Issuer { issuer, did } = did_jwk_issuer();
    let (holder_did, identity) = holder_presents(GOOD_CODE).await;

    let vc = issuer.issue(&identity).await.unwrap();

    assert_eq!(vc.issuer, did);
    assert_eq!(vc.credential_subject.id, holder_did);
    assert_eq!(vc.credential_subject.claims["username"], "octocat");
    assert_eq!(
        vc.credential_type,
        vec!["VerifiableCredential", "TBDeveloperCredential"]
    );
    assert!(vc.id.starts_with("urn:uuid:"));
    relying_party_check(&vc).await.unwrap();
}

#[tokio::test]
async fn test_credential_json_shape() {
    let Issuer { issuer, .. } = did_jwk_issuer();
    let (_, identity) = holder_presents(GOOD_CODE).await;
    let vc = issuer.issue(&identity).await.unwrap();

    let value = serde_json::to_value(&vc).unwrap();
    assert_eq!(value["@context"][0], "https://www.w3.org/2018/credentials/v1");
    assert!(value["issuanceDate"].is_string());
    assert_eq!(value["proof"]["type"], "JsonWebSignature2020");
    assert_eq!(value["proof"]["proofPurpose"], "assertionMethod");
    assert!(value["proof"]["jws"].as_str().unwrap().contains(".."));

    // Survives a JSON round trip with the proof intact.
    let decoded: VerifiableCredential = serde_json::from_value(value).unwrap();
    relying_party_check(&decoded).await.unwrap();
}

#[tokio::test]
async fn test_tampered_credential_fails() {
    let Issuer { issuer, .. } = did_jwk_issuer();
    let (_, identity) = holder_presents(GOOD_CODE).await;
    let mut vc = issuer.issue(&identity).await.unwrap();

    vc.credential_subject
        .claims
        .insert("username".into(), json!("mallory"));
    assert!(matches!(
        relying_party_check(&vc).await,
        Err(CredentialError::Verification(_))
    ));
}

#[tokio::test]
async fn test_other_issuer_key_fails() {
    let Issuer { issuer, .. } = did_jwk_issuer();
    let (_, identity) = holder_presents(GOOD_CODE).await;
    let vc = issuer.issue(&identity).await.unwrap();

    let stranger = KeyPair::generate().public_key().to_jwk();
    assert!(vc
        .verify_proof(&stranger, &AlgorithmRegistry::new())
        .is_err());
}

#[tokio::test]
async fn test_rejected_code_issues_nothing() {
    let Issuer { issuer, .. } = did_jwk_issuer();
    let (_, identity) = holder_presents("expired-code").await;

    assert!(matches!(
        issuer.issue(&identity).await,
        Err(CredentialError::IdentityLookupFailure(_))
    ));
}

#[tokio::test]
async fn test_expiring_credential() {
    let Issuer { issuer, .. } = did_jwk_issuer();
    let issuer = issuer.with_expiration(Duration::days(365));
    let (_, identity) = holder_presents(GOOD_CODE).await;

    let vc = issuer.issue(&identity).await.unwrap();
    assert!(!vc.is_expired());
    assert!(vc.expiration_date.is_some());
    relying_party_check(&vc).await.unwrap();
}
