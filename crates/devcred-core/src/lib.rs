//! Devcred Core — DID and DID URL syntax shared by every Devcred crate.

pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{Did, DidUrl};
