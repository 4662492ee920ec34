//! `devcred keygen` — Generate a holder key.

use clap::Args;
use std::path::PathBuf;

use devcred_crypto::{KeyPair, Secp256k1KeyPair};
use devcred_identity::{did_jwk, did_key};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the private JWK.
    #[arg(short, long, default_value = "holder-key.json")]
    pub out: PathBuf,

    /// Generate a secp256k1 (ES256K) key instead of Ed25519.
    #[arg(long)]
    pub secp256k1: bool,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.out.display()
        );
    }

    let (private, public) = if args.secp256k1 {
        let kp = Secp256k1KeyPair::generate();
        (kp.to_jwk(), kp.public_jwk())
    } else {
        let kp = KeyPair::generate();
        (kp.to_jwk(), kp.public_key().to_jwk())
    };

    std::fs::write(&args.out, serde_json::to_string_pretty(&private)?)?;

    println!("Key written to {}", args.out.display());
    println!("  did:jwk  {}", did_jwk(&public)?);
    println!("  did:key  {}", did_key(&public)?);
    Ok(())
}
