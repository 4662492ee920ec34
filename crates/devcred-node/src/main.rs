//! Devcred Node — entry point.
//!
//! Serves credential issuance with configuration from a TOML file or defaults.

mod api;
mod config;
mod state;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::DevcredConfig;
use devcred_crypto::KeyPair;
use devcred_identity::did_jwk;
use state::NodeState;

/// Devcred Node
#[derive(Parser, Debug)]
#[command(name = "devcred-node", version, about = "Devcred credential issuance node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "DEVCRED_CONFIG", default_value = "devcred.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Override the GitHub OAuth client id.
    #[arg(long, env = "GITHUB_CLIENT_ID", hide_env_values = true)]
    github_client_id: Option<String>,

    /// Override the GitHub OAuth client secret.
    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    github_client_secret: Option<String>,

    /// Generate an issuer key and a default config file, then exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = DevcredConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level.clone() {
        config.logging.level = level;
    }
    if let Some(id) = args.github_client_id.clone() {
        config.github.client_id = id;
    }
    if let Some(secret) = args.github_client_secret.clone() {
        config.github.client_secret = secret;
    }

    init_tracing(&config);

    if args.init {
        return init(config, &args.config);
    }

    tracing::info!("Devcred Node v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(NodeState::from_config(&config, &args.config)?);
    let listen_addr = config.api_socket_addr()?;
    api::start_api_server(listen_addr, state, shutdown_signal()).await?;

    tracing::info!("Devcred node exited cleanly");
    Ok(())
}

fn init_tracing(config: &DevcredConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Write a fresh Ed25519 issuer key and save `config`, with overrides
/// applied, naming its `did:jwk`.
fn init(mut config: DevcredConfig, config_path: &Path) -> anyhow::Result<()> {
    let key_path = DevcredConfig::resolve_path(config_path, &config.issuer.key_path);
    if key_path.exists() {
        anyhow::bail!("issuer key {} already exists", key_path.display());
    }

    let keypair = KeyPair::generate();
    let did = did_jwk(&keypair.public_key().to_jwk())?;
    if let Some(parent) = key_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&key_path, serde_json::to_string_pretty(&keypair.to_jwk())?)?;

    config.issuer.kid = Some(format!("{}#0", did));
    config.issuer.did = Some(did.to_string());
    config.save(config_path)?;

    tracing::info!(
        did = %did,
        key = %key_path.display(),
        path = %config_path.display(),
        "wrote issuer key and config"
    );
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("received shutdown signal, initiating graceful shutdown");
}
