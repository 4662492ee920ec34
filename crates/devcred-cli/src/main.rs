//! Devcred CLI — holder-side tooling for DID-authenticated credential requests.
//!
//! Subcommands: keygen, token, request, resolve.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Devcred — developer credentials for DID holders.
#[derive(Parser, Debug)]
#[command(name = "devcred", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a holder key and print its did:jwk.
    Keygen(commands::keygen::KeygenArgs),
    /// Mint a signed bearer token carrying an OAuth authorization code.
    Token(commands::token::TokenArgs),
    /// Request a credential from a devcred node.
    Request(commands::request::RequestArgs),
    /// Resolve a DID or dereference a DID URL with the built-in methods.
    Resolve(commands::resolve::ResolveArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Token(args) => commands::token::run(args),
        Commands::Request(args) => commands::request::run(args).await,
        Commands::Resolve(args) => commands::resolve::run(args).await,
    }
}
