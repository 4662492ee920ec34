//! Fixtures shared by the cross-crate flows in `tests/`.

use std::sync::Arc;

use async_trait::async_trait;
use devcred_credentials::{CredentialError, IdentityProvider};
use devcred_crypto::{AlgorithmRegistry, Signer};
use devcred_identity::{
    CompositeDidResolver, DidDocument, DidStore, DidUrlResolver, JwkDidResolver, KeyDidResolver,
    LocalDidResolver,
};
use devcred_jwt::{encode_jwt, JwtHeader, JwtVerifier};
use serde_json::{Map, Value};

/// Authorization code the fake provider accepts.
pub const GOOD_CODE: &str = "good-code";

/// Identity provider that knows one code and one login.
pub struct FixedLogin(pub &'static str);

#[async_trait]
impl IdentityProvider for FixedLogin {
    async fn exchange_and_lookup(&self, code: &str) -> Result<String, CredentialError> {
        if code == GOOD_CODE {
            Ok(self.0.to_string())
        } else {
            Err(CredentialError::IdentityLookupFailure(format!(
                "bad_verification_code: {}",
                code
            )))
        }
    }
}

/// Resolver for `did:jwk`, `did:key`, and the given stored documents.
pub fn resolver_with(documents: Vec<DidDocument>) -> Arc<DidUrlResolver> {
    let store = Arc::new(DidStore::new());
    for doc in documents {
        if let Err(e) = store.insert(doc) {
            tracing::warn!(error = %e, "fixture document rejected");
        }
    }

    let mut chain = CompositeDidResolver::new();
    chain.add_resolver(Box::new(JwkDidResolver));
    chain.add_resolver(Box::new(KeyDidResolver));
    chain.add_resolver(Box::new(LocalDidResolver::new(store)));
    Arc::new(DidUrlResolver::new(Arc::new(chain)))
}

/// Verifier over [`resolver_with`] and the default algorithm registry.
pub fn verifier_with(documents: Vec<DidDocument>) -> JwtVerifier {
    JwtVerifier::new(resolver_with(documents), Arc::new(AlgorithmRegistry::new()))
}

/// Object claims from a `json!` literal.
pub fn claims(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be a JSON object, got {}", other),
    }
}

/// Compact JWT with header `{typ: JWT, alg: <signer alg>, kid}`.
pub fn sign_token(signer: &dyn Signer, kid: &str, claims: &Map<String, Value>) -> String {
    encode_jwt(&JwtHeader::new(signer.algorithm(), kid), claims, signer)
        .unwrap_or_else(|e| panic!("fixture token failed to sign: {}", e))
}
