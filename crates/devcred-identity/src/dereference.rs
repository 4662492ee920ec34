use std::sync::Arc;

use devcred_core::{Did, DidUrl};
use serde::Serialize;

use crate::did_resolver::{CompositeDidResolver, DidResolver};
use crate::document::{DidDocument, Service, VerificationMethod};
use crate::error::IdentityError;
use crate::methods::{JwkDidResolver, KeyDidResolver};

/// What a DID URL points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    /// The URL had no fragment.
    Document(DidDocument),
    VerificationMethod(VerificationMethod),
    Service(Service),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Document(_) => "document",
            Resource::VerificationMethod(_) => "verification method",
            Resource::Service(_) => "service",
        }
    }
}

/// Resolves DIDs and dereferences DID URLs through a resolver backend.
#[derive(Clone)]
pub struct DidUrlResolver {
    backend: Arc<dyn DidResolver>,
}

impl DidUrlResolver {
    pub fn new(backend: Arc<dyn DidResolver>) -> Self {
        Self { backend }
    }

    /// Resolver for the self-certifying methods (`did:jwk`, `did:key`).
    pub fn with_builtin_methods() -> Self {
        let mut chain = CompositeDidResolver::new();
        chain.add_resolver(Box::new(JwkDidResolver));
        chain.add_resolver(Box::new(KeyDidResolver));
        Self::new(Arc::new(chain))
    }

    /// Resolve `did` to its document.
    pub async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let did = Did::new(did)?;
        self.backend.resolve(&did).await
    }

    /// Dereference `did_url` to the resource it names.
    ///
    /// Without a fragment the whole document is returned. With one, the base
    /// DID is resolved and its verification methods, then its services, are
    /// searched for an entry whose id is the full URL, the bare fragment, or
    /// `#fragment`.
    pub async fn dereference(&self, did_url: &str) -> Result<Resource, IdentityError> {
        let url = DidUrl::parse(did_url)?;
        let doc = self.backend.resolve(url.did()).await?;

        let Some(fragment) = url.fragment() else {
            return Ok(Resource::Document(doc));
        };

        if let Some(vm) = doc.find_verification_method(did_url, fragment) {
            tracing::debug!(did_url = %did_url, "dereferenced to verification method");
            return Ok(Resource::VerificationMethod(vm.clone()));
        }
        if let Some(service) = doc.find_service(did_url, fragment) {
            tracing::debug!(did_url = %did_url, "dereferenced to service");
            return Ok(Resource::Service(service.clone()));
        }

        Err(IdentityError::Dereference(format!(
            "no verification method or service '{}' in {}",
            fragment, doc.id
        )))
    }
}
