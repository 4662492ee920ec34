pub mod keygen;
pub mod request;
pub mod resolve;
pub mod token;

use std::path::Path;

use anyhow::Context;
use devcred_crypto::{signer_from_jwk, Jwk, Signer};
use devcred_identity::did_jwk;

/// A holder key loaded from disk, with the `did:jwk` it controls.
pub struct HolderKey {
    pub did: String,
    pub signer: Box<dyn Signer>,
}

impl HolderKey {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        let jwk: Jwk = serde_json::from_str(&contents)
            .with_context(|| format!("parsing key file {}", path.display()))?;
        Self::from_jwk(&jwk)
    }

    pub fn from_jwk(jwk: &Jwk) -> anyhow::Result<Self> {
        let signer = signer_from_jwk(jwk)?;
        let did = did_jwk(&signer.public_jwk())?.to_string();
        Ok(Self { did, signer })
    }

    /// The single verification method of a `did:jwk` document.
    pub fn kid(&self) -> String {
        format!("{}#0", self.did)
    }
}
