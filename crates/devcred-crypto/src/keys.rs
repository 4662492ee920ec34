use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;
use crate::jwk::{Jwk, CRV_ED25519, CRV_SECP256K1, KTY_EC, KTY_OKP};

/// Ed25519 key pair for signing operations.
/// Private key material is zeroized on drop.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create a key pair from a 32-byte seed.
    /// The seed is used directly as the Ed25519 private key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Load from a private OKP/Ed25519 JWK (`d` required).
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, CryptoError> {
        if jwk.kty != KTY_OKP || jwk.curve() != CRV_ED25519 {
            return Err(CryptoError::InvalidKey(format!(
                "expected an OKP/Ed25519 key, got {}/{}",
                jwk.kty,
                jwk.curve()
            )));
        }
        let d = Zeroizing::new(jwk.decode_member("d")?);
        let kp = Self::from_bytes(&d)?;

        if let Some(x) = &jwk.x {
            if *x != URL_SAFE_NO_PAD.encode(kp.public_key().as_bytes()) {
                return Err(CryptoError::InvalidKey(
                    "JWK public component does not match its private component".into(),
                ));
            }
        }
        Ok(kp)
    }

    /// Export as a private JWK (includes `d`).
    pub fn to_jwk(&self) -> Jwk {
        let mut jwk = self.public_key().to_jwk();
        jwk.d = Some(URL_SAFE_NO_PAD.encode(self.signing_key.to_bytes()));
        jwk
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Access the underlying ed25519-dalek SigningKey for signing operations.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

/// Ed25519 public key for verification operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Encode as a public OKP JWK.
    pub fn to_jwk(&self) -> Jwk {
        Jwk::ed25519(self.as_bytes())
    }
}

/// secp256k1 key pair for ES256K signing.
pub struct Secp256k1KeyPair {
    signing_key: k256::ecdsa::SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: k256::ecdsa::SigningKey::random(&mut OsRng),
        }
    }

    /// Load from a private EC/secp256k1 JWK (`d` required).
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, CryptoError> {
        if jwk.kty != KTY_EC || jwk.curve() != CRV_SECP256K1 {
            return Err(CryptoError::InvalidKey(format!(
                "expected an EC/secp256k1 key, got {}/{}",
                jwk.kty,
                jwk.curve()
            )));
        }
        let d = Zeroizing::new(jwk.decode_member("d")?);
        let signing_key = k256::ecdsa::SigningKey::from_slice(&d)
            .map_err(|_| CryptoError::InvalidKey("invalid secp256k1 scalar".into()))?;
        Ok(Self { signing_key })
    }

    /// Export as a private JWK (includes `d`).
    pub fn to_jwk(&self) -> Jwk {
        let mut jwk = self.public_jwk();
        jwk.d = Some(URL_SAFE_NO_PAD.encode(self.signing_key.to_bytes()));
        jwk
    }

    /// Public key as an EC JWK with uncompressed coordinates.
    pub fn public_jwk(&self) -> Jwk {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
        let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
        Jwk::secp256k1(&x, &y)
    }

    /// SEC1 compressed public key (33 bytes).
    pub fn public_key_compressed(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    pub(crate) fn signing_key(&self) -> &k256::ecdsa::SigningKey {
        &self.signing_key
    }
}
