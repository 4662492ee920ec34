use dashmap::DashMap;
use devcred_core::Did;

use crate::document::DidDocument;
use crate::error::IdentityError;

/// In-memory store of DID documents.
///
/// Backed by a `DashMap`, so it can be shared across request handlers and
/// filled while resolutions are in flight.
pub struct DidStore {
    /// DID URI -> DidDocument
    store: DashMap<String, DidDocument>,
}

impl DidStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Add a document. Its `id` must be a valid DID not yet in the store.
    pub fn insert(&self, doc: DidDocument) -> Result<Did, IdentityError> {
        let did = Did::new(doc.id.as_str())?;

        if self.store.contains_key(did.as_str()) {
            return Err(IdentityError::DuplicateDid(did.to_string()));
        }
        self.store.insert(did.to_string(), doc);

        tracing::info!(did = %did, "DID document stored");
        Ok(did)
    }

    /// Get a copy of the document for `did`.
    pub fn get(&self, did: &str) -> Option<DidDocument> {
        self.store.get(did).map(|entry| entry.clone())
    }

    /// Number of DIDs in the store.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for DidStore {
    fn default() -> Self {
        Self::new()
    }
}
