//! Devcred JWT — compact JWT parsing and encoding, and verification of
//! tokens whose `kid` names a verification method in a DID document.

pub mod error;
pub mod jwt;
pub mod verifier;

pub use error::JwtError;
pub use jwt::{encode_jwt, CompactJwt, JwtHeader};
pub use verifier::{JwtVerifier, VerifiedIdentity};
