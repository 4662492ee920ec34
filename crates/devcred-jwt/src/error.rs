use devcred_identity::IdentityError;

/// Reasons a DID-anchored JWT is rejected. Every variant is terminal.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("malformed JWT: {0}")]
    MalformedJwt(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("DID resolution failed: {0}")]
    DidResolutionFailure(String),

    #[error("DID URL dereference failed: {0}")]
    DereferenceFailure(String),

    #[error("verification method has no public key: {0}")]
    MissingPublicKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("signature does not match")]
    SignatureMismatch,

    #[error("JWT signing failed: {0}")]
    Signing(String),
}

impl From<IdentityError> for JwtError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Dereference(msg) => JwtError::DereferenceFailure(msg),
            other => JwtError::DidResolutionFailure(other.to_string()),
        }
    }
}
