use crate::error::CryptoError;
use crate::jwk::{Jwk, CRV_ED25519, CRV_SECP256K1};
use crate::keys::{KeyPair, Secp256k1KeyPair};

/// A private key able to produce JWS signatures.
pub trait Signer: Send + Sync {
    /// JOSE `alg` value of the signatures this key produces.
    fn algorithm(&self) -> &'static str;

    /// Public half of the key as a JWK.
    fn public_jwk(&self) -> Jwk;

    /// Sign `message`, returning the raw JWS signature bytes.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

impl Signer for KeyPair {
    fn algorithm(&self) -> &'static str {
        "EdDSA"
    }

    fn public_jwk(&self) -> Jwk {
        self.public_key().to_jwk()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        use ed25519_dalek::Signer as _;
        Ok(self.signing_key().sign(message).to_bytes().to_vec())
    }
}

impl Signer for Secp256k1KeyPair {
    fn algorithm(&self) -> &'static str {
        "ES256K"
    }

    fn public_jwk(&self) -> Jwk {
        Secp256k1KeyPair::public_jwk(self)
    }

    // r || s, low-S normalized
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        use k256::ecdsa::signature::Signer as _;
        let signature: k256::ecdsa::Signature = self
            .signing_key()
            .try_sign(message)
            .map_err(|e| CryptoError::SigningError(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// Load a signer from a private JWK, choosing the key type by its curve.
pub fn signer_from_jwk(jwk: &Jwk) -> Result<Box<dyn Signer>, CryptoError> {
    match jwk.curve() {
        CRV_ED25519 => Ok(Box::new(KeyPair::from_jwk(jwk)?)),
        CRV_SECP256K1 => Ok(Box::new(Secp256k1KeyPair::from_jwk(jwk)?)),
        other => Err(CryptoError::UnsupportedAlgorithm(format!(
            "no signer for curve '{}'",
            other
        ))),
    }
}
