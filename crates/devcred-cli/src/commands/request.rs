//! `devcred request` — Request a credential from a node.

use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

use super::token::mint;
use super::HolderKey;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Holder private JWK.
    #[arg(short, long, default_value = "holder-key.json")]
    pub key: PathBuf,

    /// GitHub OAuth authorization code.
    #[arg(short, long)]
    pub code: String,

    /// Base URL of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:9000")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct CredentialResponse {
    credential: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    errors: Vec<String>,
}

pub async fn run(args: &RequestArgs) -> anyhow::Result<()> {
    let holder = HolderKey::load(&args.key)?;
    let token = mint(&holder, &args.code, chrono::Utc::now().timestamp())?;
    tracing::debug!(did = %holder.did, "token minted");

    let url = format!("{}/credential", args.endpoint.trim_end_matches('/'));
    let resp = reqwest::Client::new()
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: CredentialResponse = r.json().await?;
            println!("{}", serde_json::to_string_pretty(&data.credential)?);
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!("request failed (HTTP {}): {}", status, err.errors.join("; "));
            } else {
                anyhow::bail!("request failed (HTTP {})", status);
            }
        }
        Err(e) => {
            println!("Could not reach node at {}", args.endpoint);
            println!("  Error: {}", e);
            println!();
            println!("Is the node running? Start it with: devcred-node");
        }
    }

    Ok(())
}
