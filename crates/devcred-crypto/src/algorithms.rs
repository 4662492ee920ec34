//! Registry of signature algorithms accepted for DID-anchored tokens.
//!
//! Entries are keyed `"<alg>:<crv>"`. The curve part may be empty, which lets
//! one verifier be registered for an algorithm regardless of curve
//! (`"ES256K:"`) or for a curve regardless of algorithm (`":secp256k1"`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CryptoError;
use crate::jwk::{VerificationKey, CRV_ED25519, CRV_SECP256K1};

/// Verifies raw JWS signatures with an imported key.
pub trait SignatureVerifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Check `signature` over `message`. Any failure, including an
    /// undecodable signature, is reported as `SignatureVerificationFailed`;
    /// a key of the wrong type is reported as `InvalidKey`.
    fn verify(
        &self,
        key: &VerificationKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;
}

/// Ed25519 (RFC 8032) signatures, 64 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn name(&self) -> &'static str {
        "Ed25519"
    }

    fn verify(
        &self,
        key: &VerificationKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        use ed25519_dalek::Verifier;

        let VerificationKey::Ed25519(key) = key else {
            return Err(CryptoError::InvalidKey(format!(
                "Ed25519 verifier cannot use a {} key",
                key.curve()
            )));
        };
        let signature = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;
        key.verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// ECDSA over secp256k1 with SHA-256, 64-byte `r || s` signatures (low-S only).
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn name(&self) -> &'static str {
        "ECDSA-secp256k1-SHA256"
    }

    fn verify(
        &self,
        key: &VerificationKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        use k256::ecdsa::signature::Verifier;

        let VerificationKey::Secp256k1(key) = key else {
            return Err(CryptoError::InvalidKey(format!(
                "secp256k1 verifier cannot use a {} key",
                key.curve()
            )));
        };
        let signature = k256::ecdsa::Signature::from_slice(signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;
        key.verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// A registered verifier together with the key it was registered under.
#[derive(Clone)]
pub struct AlgorithmDescriptor {
    alg: String,
    crv: String,
    verifier: Arc<dyn SignatureVerifier>,
}

impl AlgorithmDescriptor {
    /// Create a descriptor for `alg`/`crv` (either may be empty).
    pub fn new(alg: &str, crv: &str, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            alg: alg.to_string(),
            crv: crv.to_string(),
            verifier,
        }
    }

    /// Algorithm part of the registry key.
    pub fn alg(&self) -> &str {
        &self.alg
    }

    /// Curve part of the registry key (possibly empty).
    pub fn crv(&self) -> &str {
        &self.crv
    }

    /// Registry key, `"<alg>:<crv>"`.
    pub fn key(&self) -> String {
        algorithm_key(&self.alg, &self.crv)
    }

    /// Verify with the registered verifier.
    pub fn verify(
        &self,
        key: &VerificationKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        self.verifier.verify(key, message, signature)
    }
}

impl fmt::Debug for AlgorithmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmDescriptor")
            .field("alg", &self.alg)
            .field("crv", &self.crv)
            .field("verifier", &self.verifier.name())
            .finish()
    }
}

/// Build a registry key.
pub fn algorithm_key(alg: &str, crv: &str) -> String {
    format!("{}:{}", alg, crv)
}

/// Mapping from `"<alg>:<crv>"` to a verifier.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    entries: HashMap<String, AlgorithmDescriptor>,
}

impl AlgorithmRegistry {
    /// Registry seeded with the supported algorithms:
    ///
    /// | key                | verifier  |
    /// |--------------------|-----------|
    /// | `ES256K:`          | secp256k1 |
    /// | `ES256K:secp256k1` | secp256k1 |
    /// | `:secp256k1`       | secp256k1 |
    /// | `EdDSA:Ed25519`    | Ed25519   |
    pub fn new() -> Self {
        let secp256k1: Arc<dyn SignatureVerifier> = Arc::new(Secp256k1Verifier);
        let ed25519: Arc<dyn SignatureVerifier> = Arc::new(Ed25519Verifier);

        let mut registry = Self::empty();
        registry.register("ES256K", "", Arc::clone(&secp256k1));
        registry.register("ES256K", CRV_SECP256K1, Arc::clone(&secp256k1));
        registry.register("", CRV_SECP256K1, secp256k1);
        registry.register("EdDSA", CRV_ED25519, ed25519);
        registry
    }

    /// Registry with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) the verifier for `alg`/`crv`.
    pub fn register(&mut self, alg: &str, crv: &str, verifier: Arc<dyn SignatureVerifier>) {
        let descriptor = AlgorithmDescriptor::new(alg, crv, verifier);
        self.entries.insert(descriptor.key(), descriptor);
    }

    /// Find the verifier for a token `alg` and key `crv` (empty if the key has
    /// no curve).
    ///
    /// Tries `"<alg>:<crv>"` first, then the curve-independent `"<alg>:"`.
    pub fn lookup(&self, alg: &str, crv: &str) -> Result<&AlgorithmDescriptor, CryptoError> {
        let exact = algorithm_key(alg, crv);
        let found = self.entries.get(&exact).or_else(|| {
            if crv.is_empty() {
                None
            } else {
                self.entries.get(&algorithm_key(alg, ""))
            }
        });
        match found {
            Some(descriptor) => {
                tracing::debug!(key = %exact, matched = %descriptor.key(), "algorithm found");
                Ok(descriptor)
            }
            None => {
                tracing::debug!(key = %exact, "no algorithm registered");
                Err(CryptoError::UnsupportedAlgorithm(exact))
            }
        }
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::{import_verification_key, normalize_jwk_for_import};
    use crate::keys::{KeyPair, Secp256k1KeyPair};
    use crate::signing::Signer;

    struct AcceptAll;

    impl SignatureVerifier for AcceptAll {
        fn name(&self) -> &'static str {
            "accept-all"
        }

        fn verify(&self, _: &VerificationKey, _: &[u8], _: &[u8]) -> Result<(), CryptoError> {
            Ok(())
        }
    }

    fn import(jwk: &crate::jwk::Jwk, alg: &str) -> VerificationKey {
        import_verification_key(&normalize_jwk_for_import(jwk, alg)).unwrap()
    }

    #[test]
    fn test_default_keys() {
        let registry = AlgorithmRegistry::new();
        assert_eq!(
            registry.keys(),
            vec![":secp256k1", "ES256K:", "ES256K:secp256k1", "EdDSA:Ed25519"]
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_lookup_exact() {
        let registry = AlgorithmRegistry::new();
        let d = registry.lookup("EdDSA", "Ed25519").unwrap();
        assert_eq!(d.key(), "EdDSA:Ed25519");
    }

    #[test]
    fn test_lookup_empty_curve_fallback() {
        let registry = AlgorithmRegistry::new();
        // no "ES256K:P-256" entry, but "ES256K:" is registered
        let d = registry.lookup("ES256K", "P-256").unwrap();
        assert_eq!(d.key(), "ES256K:");
    }

    #[test]
    fn test_lookup_curve_without_alg() {
        let registry = AlgorithmRegistry::new();
        assert!(registry.lookup("", "secp256k1").is_ok());
    }

    #[test]
    fn test_lookup_unregistered_alg() {
        let registry = AlgorithmRegistry::new();
        let err = registry.lookup("HS256", "Ed25519").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedAlgorithm(k) if k == "HS256:Ed25519"));
    }

    #[test]
    fn test_lookup_eddsa_has_no_curve_fallback() {
        let registry = AlgorithmRegistry::new();
        assert!(registry.lookup("EdDSA", "").is_err());
        assert!(registry.lookup("EdDSA", "X25519").is_err());
    }

    #[test]
    fn test_empty_registry() {
        let registry = AlgorithmRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.lookup("EdDSA", "Ed25519").is_err());
    }

    #[test]
    fn test_register_test_double() {
        let mut registry = AlgorithmRegistry::empty();
        registry.register("EdDSA", "Ed25519", Arc::new(AcceptAll));
        let kp = KeyPair::generate();
        let key = import(&kp.public_jwk(), "EdDSA");
        let d = registry.lookup("EdDSA", "Ed25519").unwrap();
        assert!(d.verify(&key, b"anything", b"not a signature").is_ok());
    }

    #[test]
    fn test_ed25519_verifier_rejects_secp256k1_key() {
        let kp = Secp256k1KeyPair::generate();
        let key = import(&kp.public_jwk(), "ES256K");
        let sig = kp.sign(b"msg").unwrap();
        assert!(matches!(
            Ed25519Verifier.verify(&key, b"msg", &sig),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_bad_signature_length_is_mismatch() {
        let kp = KeyPair::generate();
        let key = import(&kp.public_jwk(), "EdDSA");
        assert!(matches!(
            Ed25519Verifier.verify(&key, b"msg", &[0u8; 10]),
            Err(CryptoError::SignatureVerificationFailed)
        ));

        let kp = Secp256k1KeyPair::generate();
        let key = import(&kp.public_jwk(), "ES256K");
        assert!(matches!(
            Secp256k1Verifier.verify(&key, b"msg", &[0u8; 63]),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_every_bit_flip_fails() {
        let kp = KeyPair::from_seed(&[5u8; 32]);
        let key = import(&kp.public_jwk(), "EdDSA");
        let sig = kp.sign(b"payload").unwrap();
        for bit in 0..sig.len() * 8 {
            let mut tampered = sig.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            assert!(
                Ed25519Verifier.verify(&key, b"payload", &tampered).is_err(),
                "bit {} flip was accepted",
                bit
            );
        }
    }
}
