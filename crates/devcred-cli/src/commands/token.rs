//! `devcred token` — Mint a DID-anchored bearer token.

use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use devcred_jwt::{encode_jwt, JwtHeader};

use super::HolderKey;

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Holder private JWK.
    #[arg(short, long, default_value = "holder-key.json")]
    pub key: PathBuf,

    /// GitHub OAuth authorization code, sent as `jti`.
    #[arg(short, long)]
    pub code: String,
}

pub fn run(args: &TokenArgs) -> anyhow::Result<()> {
    let holder = HolderKey::load(&args.key)?;
    println!("{}", mint(&holder, &args.code, chrono::Utc::now().timestamp())?);
    Ok(())
}

/// Sign a `typ: JWT` token with `kid = <did>#0` and claims `jti`, `iat`, `iss`.
pub fn mint(holder: &HolderKey, code: &str, issued_at: i64) -> anyhow::Result<String> {
    let header = JwtHeader::new(holder.signer.algorithm(), holder.kid());

    let mut claims = Map::new();
    claims.insert("jti".into(), Value::from(code));
    claims.insert("iat".into(), Value::from(issued_at));
    claims.insert("iss".into(), Value::from(holder.did.as_str()));

    Ok(encode_jwt(&header, &claims, holder.signer.as_ref())?)
}
