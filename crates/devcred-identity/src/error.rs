use devcred_core::CoreError;

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("duplicate DID: {0}")]
    DuplicateDid(String),

    #[error("unsupported DID method: {0}")]
    UnsupportedMethod(String),

    #[error("DID resolution failed: {0}")]
    DidResolution(String),

    #[error("DID URL dereference failed: {0}")]
    Dereference(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] devcred_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<CoreError> for IdentityError {
    fn from(e: CoreError) -> Self {
        IdentityError::InvalidDid(e.to_string())
    }
}
