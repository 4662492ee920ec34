//! JSON Web Key (RFC 7517) model and conversion into verification keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CryptoError;

/// Key type for Edwards-curve keys (RFC 8037).
pub const KTY_OKP: &str = "OKP";
/// Key type for short-Weierstrass elliptic-curve keys.
pub const KTY_EC: &str = "EC";
/// Curve name for Ed25519 keys.
pub const CRV_ED25519: &str = "Ed25519";
/// Curve name for secp256k1 keys.
pub const CRV_SECP256K1: &str = "secp256k1";

/// A JSON Web Key.
///
/// Only the members needed for OKP/EC signature keys are modelled. The
/// private component `d` never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
}

impl Jwk {
    /// Public Ed25519 key.
    pub fn ed25519(public_key: &[u8; 32]) -> Self {
        Self {
            kty: KTY_OKP.into(),
            crv: Some(CRV_ED25519.into()),
            x: Some(URL_SAFE_NO_PAD.encode(public_key)),
            ..Self::empty()
        }
    }

    /// Public secp256k1 key from its affine coordinates.
    pub fn secp256k1(x: &[u8], y: &[u8]) -> Self {
        Self {
            kty: KTY_EC.into(),
            crv: Some(CRV_SECP256K1.into()),
            x: Some(URL_SAFE_NO_PAD.encode(x)),
            y: Some(URL_SAFE_NO_PAD.encode(y)),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            kty: String::new(),
            crv: None,
            x: None,
            y: None,
            d: None,
            alg: None,
            kid: None,
            key_use: None,
            ext: None,
            key_ops: None,
        }
    }

    /// Curve name, or the empty string when the key carries none.
    pub fn curve(&self) -> &str {
        self.crv.as_deref().unwrap_or_default()
    }

    /// Whether the key carries private material.
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Copy of this key with the private component removed.
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }

    /// Decode a base64url member (`x`, `y`, `d`) into raw bytes.
    pub fn decode_member(&self, name: &str) -> Result<Vec<u8>, CryptoError> {
        let value = match name {
            "x" => self.x.as_deref(),
            "y" => self.y.as_deref(),
            "d" => self.d.as_deref(),
            other => {
                return Err(CryptoError::InvalidInput(format!(
                    "unknown JWK member: {}",
                    other
                )))
            }
        }
        .ok_or_else(|| CryptoError::InvalidKey(format!("JWK is missing '{}'", name)))?;

        URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| CryptoError::InvalidKey(format!("JWK '{}' is not valid base64url", name)))
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &self.d.as_ref().map(|_| "<redacted>"))
            .field("alg", &self.alg)
            .field("kid", &self.kid)
            .field("ext", &self.ext)
            .field("key_ops", &self.key_ops)
            .finish()
    }
}

/// Prepare a JWK found in a DID document for import as a verification key.
///
/// The returned copy:
/// - carries `alg`, taken from `header_alg` when the key does not name one;
/// - is marked extractable (`ext: true`);
/// - permits exactly the `verify` key operation;
/// - has any private component removed.
///
/// The input is left untouched.
pub fn normalize_jwk_for_import(jwk: &Jwk, header_alg: &str) -> Jwk {
    let mut normalized = jwk.to_public();
    if normalized.alg.is_none() {
        normalized.alg = Some(header_alg.to_string());
    }
    normalized.ext = Some(true);
    normalized.key_ops = Some(vec!["verify".to_string()]);
    normalized
}

/// A public key ready for signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationKey {
    Ed25519(ed25519_dalek::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
}

impl VerificationKey {
    /// Curve name of the key.
    pub fn curve(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => CRV_ED25519,
            Self::Secp256k1(_) => CRV_SECP256K1,
        }
    }
}

/// Import a normalized JWK as a verification key.
///
/// The key must allow the `verify` operation when it lists `key_ops`.
pub fn import_verification_key(jwk: &Jwk) -> Result<VerificationKey, CryptoError> {
    if let Some(ops) = &jwk.key_ops {
        if !ops.iter().any(|op| op == "verify") {
            return Err(CryptoError::InvalidKey(
                "JWK key_ops does not allow 'verify'".into(),
            ));
        }
    }

    match (jwk.kty.as_str(), jwk.curve()) {
        (KTY_OKP, CRV_ED25519) => {
            let x = jwk.decode_member("x")?;
            let bytes: [u8; 32] =
                x.as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::InvalidKeyLength {
                        expected: 32,
                        actual: x.len(),
                    })?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                .map_err(|_| CryptoError::InvalidKey("not a valid Ed25519 point".into()))?;
            Ok(VerificationKey::Ed25519(key))
        }
        (KTY_EC, CRV_SECP256K1) => {
            let x = jwk.decode_member("x")?;
            let y = jwk.decode_member("y")?;
            for coordinate in [&x, &y] {
                if coordinate.len() != 32 {
                    return Err(CryptoError::InvalidKeyLength {
                        expected: 32,
                        actual: coordinate.len(),
                    });
                }
            }
            let point = k256::EncodedPoint::from_affine_coordinates(
                k256::FieldBytes::from_slice(&x),
                k256::FieldBytes::from_slice(&y),
                false,
            );
            let key = k256::ecdsa::VerifyingKey::from_encoded_point(&point)
                .map_err(|_| CryptoError::InvalidKey("not a valid secp256k1 point".into()))?;
            Ok(VerificationKey::Secp256k1(key))
        }
        (kty, crv) => Err(CryptoError::InvalidKey(format!(
            "unsupported key type {}/{}",
            kty, crv
        ))),
    }
}
