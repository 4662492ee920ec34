/// Credential issuance errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("identity lookup failed: {0}")]
    IdentityLookupFailure(String),

    #[error("credential signing failed: {0}")]
    SigningFailure(String),

    #[error("credential verification failed: {0}")]
    Verification(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] devcred_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
