//! Devcred Credentials — verifiable credential model, identity providers,
//! and the issuer that turns a verified token into a signed credential.

pub mod credential;
pub mod error;
pub mod issuer;
pub mod provider;

pub use credential::{CredentialProof, CredentialSubject, VerifiableCredential};
pub use error::CredentialError;
pub use issuer::CredentialIssuer;
pub use provider::{GithubIdentityProvider, IdentityProvider};
