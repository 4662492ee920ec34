use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use devcred_crypto::{
    import_verification_key, normalize_jwk_for_import, AlgorithmRegistry, Jwk, Signer,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::CredentialError;

/// W3C Verifiable Credentials v1 context.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const PROOF_TYPE: &str = "JsonWebSignature2020";
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// The subject DID plus the attested claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: String,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// A W3C Verifiable Credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// `urn:uuid:<v7>`.
    pub id: String,
    /// Always starts with "VerifiableCredential".
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    /// DID of the issuer.
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    pub credential_subject: CredentialSubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

/// Detached JWS proof attached to a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    /// DID URL of the issuer key.
    pub verification_method: String,
    pub proof_purpose: String,
    /// `<header>..<signature>`; the payload is the canonical credential.
    pub jws: String,
}

impl VerifiableCredential {
    /// Create a new unsigned credential.
    pub fn new(
        issuer: String,
        subject: String,
        credential_type: Vec<String>,
        claims: Map<String, Value>,
    ) -> Self {
        let mut types = vec![VERIFIABLE_CREDENTIAL_TYPE.to_string()];
        for t in credential_type {
            if t != VERIFIABLE_CREDENTIAL_TYPE {
                types.push(t);
            }
        }

        Self {
            context: vec![CREDENTIALS_V1_CONTEXT.to_string()],
            id: format!("urn:uuid:{}", Uuid::now_v7()),
            credential_type: types,
            issuer,
            issuance_date: Utc::now().trunc_subsecs(0),
            expiration_date: None,
            credential_subject: CredentialSubject { id: subject, claims },
            proof: None,
        }
    }

    /// Set the expiration date.
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration.trunc_subsecs(0));
        self
    }

    /// Canonical bytes covered by the proof: the credential without `proof`,
    /// serialized as JSON with object keys sorted.
    pub fn signing_payload(&self) -> Result<Vec<u8>, CredentialError> {
        let mut value =
            serde_json::to_value(self).map_err(|e| CredentialError::Serialization(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.remove("proof");
        }
        serde_json::to_vec(&canonicalize(value))
            .map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Sign this credential, attaching a detached JWS proof made with
    /// `signer` and naming `verification_method` as the key.
    pub fn sign(
        mut self,
        verification_method: &str,
        signer: &dyn Signer,
    ) -> Result<Self, CredentialError> {
        let header = serde_json::json!({
            "alg": signer.algorithm(),
            "kid": verification_method,
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header).map_err(|e| CredentialError::SigningFailure(e.to_string()))?,
        );
        let payload = self
            .signing_payload()
            .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;
        let signing_input = format!("{}.{}", header_b64, URL_SAFE_NO_PAD.encode(payload));

        let signature = signer
            .sign(signing_input.as_bytes())
            .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;

        self.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.to_string(),
            created: Utc::now().trunc_subsecs(0),
            verification_method: verification_method.to_string(),
            proof_purpose: PROOF_PURPOSE.to_string(),
            jws: format!("{}..{}", header_b64, URL_SAFE_NO_PAD.encode(signature)),
        });

        Ok(self)
    }

    /// Verify the proof against the issuer's public key, using the algorithm
    /// named in the JWS header. Expired credentials fail.
    pub fn verify_proof(
        &self,
        public_jwk: &Jwk,
        registry: &AlgorithmRegistry,
    ) -> Result<(), CredentialError> {
        let proof = self
            .proof
            .as_ref()
            .ok_or_else(|| CredentialError::Verification("no proof attached".to_string()))?;

        if self.is_expired() {
            return Err(CredentialError::Verification(
                "credential has expired".to_string(),
            ));
        }

        let parts: Vec<&str> = proof.jws.split('.').collect();
        let (header_b64, signature_b64) = match parts.as_slice() {
            [header, "", signature] => (*header, *signature),
            _ => {
                return Err(CredentialError::Verification(
                    "proof is not a detached JWS".to_string(),
                ))
            }
        };

        let header: Value = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| CredentialError::Verification("unreadable JWS header".to_string()))?;
        let alg = header
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| CredentialError::Verification("JWS header has no alg".to_string()))?;

        let descriptor = registry.lookup(alg, public_jwk.curve())?;
        let key = import_verification_key(&normalize_jwk_for_import(public_jwk, alg))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CredentialError::Verification("signature is not base64url".to_string()))?;
        let signing_input = format!(
            "{}.{}",
            header_b64,
            URL_SAFE_NO_PAD.encode(self.signing_payload()?)
        );

        descriptor
            .verify(&key, signing_input.as_bytes(), &signature)
            .map_err(|_| CredentialError::Verification("signature verification failed".to_string()))
    }

    /// Check if the credential has been signed.
    pub fn is_signed(&self) -> bool {
        self.proof.is_some()
    }

    /// Check if the credential has expired.
    pub fn is_expired(&self) -> bool {
        self.expiration_date
            .map(|exp| Utc::now() > exp)
            .unwrap_or(false)
    }
}

/// Rebuild every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
