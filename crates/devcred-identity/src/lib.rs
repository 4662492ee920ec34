//! Devcred Identity Layer
//!
//! - DID Documents (W3C DID Core shape)
//! - DID resolution backends: `did:jwk`, `did:key`, in-memory store, HTTP
//!   universal resolver, and a composite fallback chain
//! - DID URL dereferencing to verification methods and services

pub mod dereference;
pub mod did;
pub mod did_resolver;
pub mod document;
pub mod error;
pub mod methods;

pub use dereference::{DidUrlResolver, Resource};
pub use did::DidStore;
pub use did_resolver::{CompositeDidResolver, DidResolver, HttpDidResolver, LocalDidResolver};
pub use document::{DidDocument, Service, VerificationMethod};
pub use error::IdentityError;
pub use methods::{did_jwk, did_key, JwkDidResolver, KeyDidResolver};
