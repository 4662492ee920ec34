//! `devcred resolve` — Resolve a DID or dereference a DID URL locally.

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use devcred_identity::{
    CompositeDidResolver, DidUrlResolver, HttpDidResolver, JwkDidResolver, KeyDidResolver,
};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// DID or DID URL (`did:jwk:...#0`).
    pub did_url: String,

    /// Universal resolver to fall back to for other methods.
    #[arg(long, env = "DEVCRED_UNIVERSAL_RESOLVER")]
    pub universal_resolver: Option<String>,

    /// Universal resolver request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

pub async fn run(args: &ResolveArgs) -> anyhow::Result<()> {
    let resolver = match &args.universal_resolver {
        Some(url) => {
            let mut chain = CompositeDidResolver::new();
            chain.add_resolver(Box::new(JwkDidResolver));
            chain.add_resolver(Box::new(KeyDidResolver));
            chain.add_resolver(Box::new(HttpDidResolver::new(
                url.as_str(),
                Duration::from_secs(args.timeout_secs),
            )?));
            DidUrlResolver::new(Arc::new(chain))
        }
        None => DidUrlResolver::with_builtin_methods(),
    };

    let resource = resolver.dereference(&args.did_url).await?;
    println!("Resolved {}:", resource.kind());
    println!("{}", serde_json::to_string_pretty(&resource)?);
    Ok(())
}
