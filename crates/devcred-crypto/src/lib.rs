//! Devcred Crypto — JSON Web Keys, signing keys, and the registry of
//! signature algorithms accepted for DID-anchored tokens.

pub mod algorithms;
pub mod error;
pub mod jwk;
pub mod keys;
pub mod signing;

pub use algorithms::{
    AlgorithmDescriptor, AlgorithmRegistry, Ed25519Verifier, Secp256k1Verifier,
    SignatureVerifier,
};
pub use error::CryptoError;
pub use jwk::{import_verification_key, normalize_jwk_for_import, Jwk, VerificationKey};
pub use keys::{KeyPair, PublicKey, Secp256k1KeyPair};
pub use signing::{signer_from_jwk, Signer};
