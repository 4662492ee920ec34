//! Shared state handed to every request handler.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use devcred_credentials::{CredentialIssuer, GithubIdentityProvider};
use devcred_crypto::{signer_from_jwk, AlgorithmRegistry, Jwk, Signer};
use devcred_identity::{
    did_jwk, CompositeDidResolver, DidDocument, DidStore, DidUrlResolver, HttpDidResolver,
    JwkDidResolver, KeyDidResolver, LocalDidResolver,
};
use devcred_jwt::JwtVerifier;

use crate::config::DevcredConfig;

/// Everything a request needs, built once at startup.
pub struct NodeState {
    pub verifier: JwtVerifier,
    pub issuer: CredentialIssuer,
    /// GitHub authorize link served on `/login`, when an OAuth app is configured.
    pub login_url: Option<String>,
}

impl NodeState {
    pub fn new(verifier: JwtVerifier, issuer: CredentialIssuer, login_url: Option<String>) -> Self {
        Self {
            verifier,
            issuer,
            login_url,
        }
    }

    /// Build the verifier, resolver chain, issuer and identity provider from
    /// configuration. `config_path` anchors relative file paths.
    pub fn from_config(config: &DevcredConfig, config_path: &Path) -> anyhow::Result<Self> {
        let resolver = build_resolver(config, config_path)?;
        let verifier = JwtVerifier::new(Arc::new(resolver), Arc::new(AlgorithmRegistry::new()));

        let key_path = DevcredConfig::resolve_path(config_path, &config.issuer.key_path);
        let signer = load_signer(&key_path)?;
        let did = match &config.issuer.did {
            Some(did) => did.clone(),
            None => did_jwk(&signer.public_jwk())?.to_string(),
        };
        let kid = config
            .issuer
            .kid
            .clone()
            .unwrap_or_else(|| format!("{}#0", did));

        if config.github.client_id.is_empty() || config.github.client_secret.is_empty() {
            tracing::warn!("GitHub OAuth client id/secret not configured; credential requests will fail");
        }
        let provider = GithubIdentityProvider::new(
            config.github.client_id.clone(),
            config.github.client_secret.clone(),
            Duration::from_secs(config.github.timeout_secs),
        )?
        .with_base_urls(&config.github.oauth_url, &config.github.api_url);
        let login_url =
            (!config.github.client_id.is_empty()).then(|| provider.authorize_url());

        let mut issuer = CredentialIssuer::new(did.clone(), kid.clone(), signer, Arc::new(provider))
            .with_credential_type(config.issuer.credential_type.clone());
        if let Some(days) = config.issuer.expiration_days {
            issuer = issuer.with_expiration(chrono::Duration::days(days));
        }

        tracing::info!(did = %did, kid = %kid, "issuer loaded");
        Ok(Self::new(verifier, issuer, login_url))
    }
}

/// Read a private JWK from `path`.
pub fn load_signer(path: &Path) -> anyhow::Result<Arc<dyn Signer>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading issuer key {}", path.display()))?;
    let jwk: Jwk = serde_json::from_str(&contents)
        .with_context(|| format!("parsing issuer key {}", path.display()))?;
    Ok(Arc::from(signer_from_jwk(&jwk)?))
}

/// Built-in methods first, then locally stored documents, then the
/// universal resolver if one is configured.
fn build_resolver(config: &DevcredConfig, config_path: &Path) -> anyhow::Result<DidUrlResolver> {
    let mut chain = CompositeDidResolver::new();
    chain.add_resolver(Box::new(JwkDidResolver));
    chain.add_resolver(Box::new(KeyDidResolver));

    if !config.resolver.documents.is_empty() {
        let store = Arc::new(DidStore::new());
        for path in &config.resolver.documents {
            let path = DevcredConfig::resolve_path(config_path, path);
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading DID document {}", path.display()))?;
            let doc: DidDocument = serde_json::from_str(&contents)
                .with_context(|| format!("parsing DID document {}", path.display()))?;
            store.insert(doc)?;
        }
        tracing::info!(documents = store.count(), "local DID documents loaded");
        chain.add_resolver(Box::new(LocalDidResolver::new(store)));
    }

    if let Some(url) = &config.resolver.universal_resolver_url {
        let http = HttpDidResolver::new(
            url.as_str(),
            Duration::from_secs(config.resolver.timeout_secs),
        )?;
        tracing::info!(endpoint = %http.endpoint(), "universal resolver enabled");
        chain.add_resolver(Box::new(http));
    }

    tracing::debug!(backends = chain.resolver_count(), "DID resolver chain built");
    Ok(DidUrlResolver::new(Arc::new(chain)))
}
