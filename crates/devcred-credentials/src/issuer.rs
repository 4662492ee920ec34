use std::sync::Arc;

use chrono::{Duration, Utc};
use devcred_crypto::Signer;
use devcred_jwt::VerifiedIdentity;
use serde_json::{Map, Value};

use crate::credential::VerifiableCredential;
use crate::error::CredentialError;
use crate::provider::IdentityProvider;

pub const DEFAULT_CREDENTIAL_TYPE: &str = "DeveloperCredential";

/// Issues credentials attesting the external login of a verified token signer.
pub struct CredentialIssuer {
    /// DID of the issuer.
    did: String,
    /// DID URL of the issuer key, written into each proof.
    kid: String,
    signer: Arc<dyn Signer>,
    provider: Arc<dyn IdentityProvider>,
    credential_type: String,
    expiration: Option<Duration>,
}

impl CredentialIssuer {
    /// Create a new credential issuer.
    pub fn new(
        did: impl Into<String>,
        kid: impl Into<String>,
        signer: Arc<dyn Signer>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            did: did.into(),
            kid: kid.into(),
            signer,
            provider,
            credential_type: DEFAULT_CREDENTIAL_TYPE.to_string(),
            expiration: None,
        }
    }

    /// Set the credential type issued after "VerifiableCredential".
    pub fn with_credential_type(mut self, credential_type: impl Into<String>) -> Self {
        self.credential_type = credential_type.into();
        self
    }

    /// Issue credentials that expire `expiration` after issuance.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Get the issuer's DID.
    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Look up the signer's external identity through the token's `jti`
    /// authorization code and issue a signed credential for it.
    pub async fn issue(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<VerifiableCredential, CredentialError> {
        let code = identity.jti().ok_or_else(|| {
            CredentialError::IdentityLookupFailure(
                "token has no 'jti' authorization code".to_string(),
            )
        })?;

        let login = self.provider.exchange_and_lookup(code).await.map_err(|e| match e {
            CredentialError::IdentityLookupFailure(_) => e,
            other => CredentialError::IdentityLookupFailure(other.to_string()),
        })?;

        let mut claims = Map::new();
        claims.insert("username".to_string(), Value::from(login));

        let mut vc = VerifiableCredential::new(
            self.did.clone(),
            identity.signer_did.clone(),
            vec![self.credential_type.clone()],
            claims,
        );
        if let Some(expiration) = self.expiration {
            vc = vc.with_expiration(Utc::now() + expiration);
        }

        let signed = vc
            .sign(&self.kid, self.signer.as_ref())
            .map_err(|e| match e {
                CredentialError::SigningFailure(_) => e,
                other => CredentialError::SigningFailure(other.to_string()),
            })?;

        tracing::info!(
            issuer = %self.did,
            subject = %identity.signer_did,
            credential_id = %signed.id,
            "credential issued"
        );

        Ok(signed)
    }
}
