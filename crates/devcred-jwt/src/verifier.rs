use std::sync::Arc;

use devcred_crypto::{
    import_verification_key, normalize_jwk_for_import, AlgorithmRegistry, CryptoError,
};
use devcred_identity::{DidUrlResolver, Resource};
use serde_json::{Map, Value};

use crate::error::JwtError;
use crate::jwt::CompactJwt;

/// Who signed a token, and what they signed.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    /// Controller of the verification method that matched `kid`.
    pub signer_did: String,
    pub payload: Map<String, Value>,
}

impl VerifiedIdentity {
    /// The `jti` claim, when it is a string.
    pub fn jti(&self) -> Option<&str> {
        self.payload.get("jti").and_then(Value::as_str)
    }
}

/// Verifies compact JWTs whose `kid` is a DID URL.
///
/// The resolver and the registry are built once and shared; a verifier holds
/// no per-request state.
#[derive(Clone)]
pub struct JwtVerifier {
    resolver: Arc<DidUrlResolver>,
    registry: Arc<AlgorithmRegistry>,
}

impl JwtVerifier {
    pub fn new(resolver: Arc<DidUrlResolver>, registry: Arc<AlgorithmRegistry>) -> Self {
        Self { resolver, registry }
    }

    /// Verify `token`, stopping at the first failing stage.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, JwtError> {
        match self.verify_stages(token).await {
            Ok(identity) => {
                tracing::info!(signer = %identity.signer_did, "JWT verified");
                Ok(identity)
            }
            Err(e) => {
                tracing::debug!(error = %e, "JWT rejected");
                Err(e)
            }
        }
    }

    async fn verify_stages(&self, token: &str) -> Result<VerifiedIdentity, JwtError> {
        let jwt = CompactJwt::parse(token)?;
        jwt.header.validate()?;
        let alg = jwt.header.alg.as_str();
        let kid = jwt.header.kid.as_str();
        tracing::debug!(alg = %alg, kid = %kid, "JWT header accepted");

        let vm = match self.resolver.dereference(kid).await? {
            Resource::VerificationMethod(vm) => vm,
            other => {
                return Err(JwtError::DereferenceFailure(format!(
                    "{} names a {}, not a verification method",
                    kid,
                    other.kind()
                )))
            }
        };
        tracing::debug!(vm = %vm.id, controller = %vm.controller, "kid dereferenced");

        let jwk = vm
            .public_key_jwk
            .as_ref()
            .ok_or_else(|| JwtError::MissingPublicKey(vm.id.clone()))?;

        let descriptor = self
            .registry
            .lookup(alg, jwk.curve())
            .map_err(|e| JwtError::UnsupportedAlgorithm(e.to_string()))?;
        tracing::debug!(algorithm = ?descriptor, "algorithm selected");

        let key = import_verification_key(&normalize_jwk_for_import(jwk, alg))
            .map_err(|e| JwtError::InvalidPublicKey(format!("{}: {}", vm.id, e)))?;

        let signature = jwt.signature()?;
        descriptor
            .verify(&key, jwt.signing_input().as_bytes(), &signature)
            .map_err(|e| match e {
                CryptoError::InvalidKey(msg) => JwtError::InvalidPublicKey(msg),
                _ => JwtError::SignatureMismatch,
            })?;

        Ok(VerifiedIdentity {
            signer_did: vm.controller,
            payload: jwt.payload,
        })
    }
}
