//! Self-certifying DID methods resolved without any network access.
//!
//! - `did:jwk`: the method-specific id is the base64url JSON of a public JWK.
//! - `did:key`: the method-specific id is a multibase (`z`, base58btc)
//!   multicodec-prefixed public key. Ed25519 (`0xed01`) and compressed
//!   secp256k1 (`0xe701`) keys are supported.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use devcred_core::Did;
use devcred_crypto::jwk::{CRV_ED25519, CRV_SECP256K1, KTY_EC, KTY_OKP};
use devcred_crypto::Jwk;

use crate::did_resolver::DidResolver;
use crate::document::DidDocument;
use crate::error::IdentityError;

const MULTICODEC_ED25519_PUB: [u8; 2] = [0xed, 0x01];
const MULTICODEC_SECP256K1_PUB: [u8; 2] = [0xe7, 0x01];

/// Build the `did:jwk` for a key. Private material is dropped first.
pub fn did_jwk(jwk: &Jwk) -> Result<Did, IdentityError> {
    let public = jwk.to_public();
    let json =
        serde_json::to_vec(&public).map_err(|e| IdentityError::Serialization(e.to_string()))?;
    Ok(Did::from_parts("jwk", &URL_SAFE_NO_PAD.encode(json))?)
}

/// Build the `did:key` for an Ed25519 or secp256k1 JWK.
pub fn did_key(jwk: &Jwk) -> Result<Did, IdentityError> {
    let mut bytes = Vec::with_capacity(35);
    match (jwk.kty.as_str(), jwk.curve()) {
        (KTY_OKP, CRV_ED25519) => {
            bytes.extend_from_slice(&MULTICODEC_ED25519_PUB);
            bytes.extend_from_slice(&jwk.decode_member("x")?);
        }
        (KTY_EC, CRV_SECP256K1) => {
            let key = devcred_crypto::import_verification_key(&jwk.to_public())?;
            let devcred_crypto::VerificationKey::Secp256k1(key) = key else {
                return Err(IdentityError::UnsupportedMethod(
                    "did:key needs a secp256k1 key".into(),
                ));
            };
            bytes.extend_from_slice(&MULTICODEC_SECP256K1_PUB);
            bytes.extend_from_slice(key.to_encoded_point(true).as_bytes());
        }
        (kty, crv) => {
            return Err(IdentityError::UnsupportedMethod(format!(
                "did:key has no multicodec for {}/{}",
                kty, crv
            )))
        }
    }
    let multibase = format!("z{}", bs58::encode(bytes).into_string());
    Ok(Did::from_parts("key", &multibase)?)
}

/// Resolves `did:jwk` identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct JwkDidResolver;

#[async_trait]
impl DidResolver for JwkDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        if did.method() != "jwk" {
            return Err(IdentityError::UnsupportedMethod(did.to_string()));
        }
        let json = URL_SAFE_NO_PAD
            .decode(did.method_specific_id())
            .map_err(|_| IdentityError::InvalidDid(format!("{}: not base64url", did)))?;
        let jwk: Jwk = serde_json::from_slice(&json)
            .map_err(|e| IdentityError::InvalidDid(format!("{}: {}", did, e)))?;
        if jwk.is_private() {
            return Err(IdentityError::InvalidDid(format!(
                "{}: embeds private key material",
                did
            )));
        }

        let mut doc = DidDocument::new(did.as_str());
        doc.add_jwk_verification_method("0", jwk);
        Ok(doc)
    }
}

/// Resolves `did:key` identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyDidResolver;

impl KeyDidResolver {
    fn decode(did: &Did) -> Result<Jwk, IdentityError> {
        let invalid = |reason: &str| IdentityError::InvalidDid(format!("{}: {}", did, reason));

        let encoded = did
            .method_specific_id()
            .strip_prefix('z')
            .ok_or_else(|| invalid("expected a base58btc multibase value"))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| invalid("not base58btc"))?;
        if bytes.len() < 2 {
            return Err(invalid("too short"));
        }
        let (codec, key) = bytes.split_at(2);

        if codec == MULTICODEC_ED25519_PUB.as_slice() {
            let key: &[u8; 32] = key
                .try_into()
                .map_err(|_| invalid("Ed25519 key must be 32 bytes"))?;
            Ok(Jwk::ed25519(key))
        } else if codec == MULTICODEC_SECP256K1_PUB.as_slice() {
            let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key)
                .map_err(|_| invalid("not a valid secp256k1 point"))?;
            let point = key.to_encoded_point(false);
            match (point.x(), point.y()) {
                (Some(x), Some(y)) => Ok(Jwk::secp256k1(x, y)),
                _ => Err(invalid("not a valid secp256k1 point")),
            }
        } else {
            Err(IdentityError::UnsupportedMethod(format!(
                "{}: unknown multicodec 0x{:02x}{:02x}",
                did, codec[0], codec[1]
            )))
        }
    }
}

#[async_trait]
impl DidResolver for KeyDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        if did.method() != "key" {
            return Err(IdentityError::UnsupportedMethod(did.to_string()));
        }
        let jwk = Self::decode(did)?;
        let mut doc = DidDocument::new(did.as_str());
        doc.add_jwk_verification_method(did.method_specific_id(), jwk);
        Ok(doc)
    }
}
