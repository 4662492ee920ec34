use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devcred_core::Did;
use serde_json::Value;

use crate::did::DidStore;
use crate::document::DidDocument;
use crate::error::IdentityError;

/// Trait for resolving DIDs to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID to its DID Document.
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError>;
}

/// Resolves DIDs from a local in-memory `DidStore`.
pub struct LocalDidResolver {
    store: Arc<DidStore>,
}

impl LocalDidResolver {
    /// Create a new local resolver backed by a DidStore.
    pub fn new(store: Arc<DidStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DidResolver for LocalDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        self.store
            .get(did.as_str())
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}

/// Resolves DIDs through a DIF universal resolver style HTTP endpoint:
/// `GET <endpoint>/1.0/identifiers/<did>`.
pub struct HttpDidResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDidResolver {
    /// Create a resolver for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("devcred/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdentityError::DidResolution(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn identifier_url(&self, did: &Did) -> String {
        format!("{}/1.0/identifiers/{}", self.endpoint, did)
    }
}

#[async_trait]
impl DidResolver for HttpDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        let url = self.identifier_url(did);
        tracing::debug!(did = %did, url = %url, "resolving DID over HTTP");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/did+ld+json, application/json")
            .send()
            .await
            .map_err(|e| IdentityError::DidResolution(format!("{}: {}", did, e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::DidNotFound(did.to_string()));
        }
        if !status.is_success() {
            return Err(IdentityError::DidResolution(format!(
                "{}: resolver returned {}",
                did, status
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Serialization(e.to_string()))?;
        document_from_resolution_body(did, body)
    }
}

/// Extract the DID document from a resolver response, which is either a DID
/// resolution result (`didDocument` + `didResolutionMetadata`) or a bare
/// document.
pub fn document_from_resolution_body(
    did: &Did,
    body: Value,
) -> Result<DidDocument, IdentityError> {
    let is_resolution_result = body.get("didDocument").is_some()
        || body.get("didResolutionMetadata").is_some();

    let document = match body {
        Value::Object(mut map) if is_resolution_result => {
            if let Some(error) = map
                .get("didResolutionMetadata")
                .and_then(|m| m.get("error"))
                .and_then(Value::as_str)
            {
                return Err(IdentityError::DidResolution(format!("{}: {}", did, error)));
            }
            match map.remove("didDocument") {
                Some(doc) if !doc.is_null() => doc,
                _ => return Err(IdentityError::DidNotFound(did.to_string())),
            }
        }
        other => other,
    };

    let doc: DidDocument = serde_json::from_value(document)
        .map_err(|e| IdentityError::Serialization(format!("DID document: {}", e)))?;
    if doc.id != did.as_str() {
        return Err(IdentityError::DidResolution(format!(
            "resolver returned document {} for {}",
            doc.id, did
        )));
    }
    Ok(doc)
}

/// Composite resolver that tries multiple resolvers in order.
///
/// A backend answering `UnsupportedMethod` or `DidNotFound` passes the DID on
/// to the next one. Any other error comes from the backend that owns the DID
/// and ends the chain. When every backend passes, the last error is returned.
pub struct CompositeDidResolver {
    resolvers: Vec<Box<dyn DidResolver>>,
}

impl CompositeDidResolver {
    /// Create a new composite resolver with no backends.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Add a resolver to the chain.
    pub fn add_resolver(&mut self, resolver: Box<dyn DidResolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of registered resolvers.
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeDidResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        let mut last_error = IdentityError::DidResolution("no resolvers configured".into());

        for resolver in &self.resolvers {
            match resolver.resolve(did).await {
                Ok(doc) => return Ok(doc),
                Err(
                    e @ (IdentityError::UnsupportedMethod(_) | IdentityError::DidNotFound(_)),
                ) => {
                    tracing::debug!(did = %did, error = %e, "resolver passed, trying next");
                    last_error = e;
                }
                Err(e) => {
                    tracing::debug!(did = %did, error = %e, "resolver rejected DID");
                    return Err(e);
                }
            }
        }

        Err(last_error)
    }
}
