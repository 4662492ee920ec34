use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Decentralized Identifier (DID).
/// Format: `did:<method>:<method-specific-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Create a new DID from a full URI string.
    pub fn new(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        let rest = uri.strip_prefix("did:").ok_or_else(|| {
            CoreError::InvalidDid(format!("DID must start with 'did:', got: {}", uri))
        })?;
        let (method, id) = rest.split_once(':').ok_or_else(|| {
            CoreError::InvalidDid(format!(
                "DID must have format 'did:<method>:<identifier>', got: {}",
                uri
            ))
        })?;

        if method.is_empty()
            || !method
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(CoreError::InvalidDid(format!(
                "DID method must be lowercase alphanumeric, got: {}",
                uri
            )));
        }
        if id.is_empty() || id.ends_with(':') || !is_method_specific_id(id) {
            return Err(CoreError::InvalidDid(format!(
                "invalid method-specific identifier in: {}",
                uri
            )));
        }

        Ok(Self(uri))
    }

    /// Create a DID from method and identifier components.
    pub fn from_parts(method: &str, identifier: &str) -> Result<Self, CoreError> {
        Self::new(format!("did:{}:{}", method, identifier))
    }

    /// Get the full DID URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the method name (`key`, `jwk`, `web`, ...).
    pub fn method(&self) -> &str {
        self.0[4..]
            .split_once(':')
            .map(|(method, _)| method)
            .unwrap_or_default()
    }

    /// Extract the method-specific identifier.
    pub fn method_specific_id(&self) -> &str {
        self.0[4..]
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or_default()
    }
}

// idchar = ALPHA / DIGIT / "." / "-" / "_" / pct-encoded, segments joined by ':'
fn is_method_specific_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex_ok = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !hex_ok {
                    return false;
                }
                i += 3;
                continue;
            }
            b if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b':') => {}
            _ => return false,
        }
        i += 1;
    }
    true
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// A DID URL: a DID optionally followed by a path, a query and a fragment.
///
/// `did:example:123/path?versionId=1#key-1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidUrl {
    raw: String,
    did: Did,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl DidUrl {
    /// Parse a DID URL. An empty fragment (`did:example:123#`) counts as absent.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let base_end = input
            .find(|c: char| matches!(c, '/' | '?' | '#'))
            .unwrap_or(input.len());

        let did = Did::new(&input[..base_end])
            .map_err(|e| CoreError::InvalidDidUrl(format!("{}: {}", input, e)))?;

        let remainder = &input[base_end..];
        let (before_fragment, fragment) = match remainder.split_once('#') {
            Some((before, fragment)) => (before, non_empty(fragment)),
            None => (remainder, None),
        };
        let (path, query) = match before_fragment.split_once('?') {
            Some((path, query)) => (non_empty(path), non_empty(query)),
            None => (non_empty(before_fragment), None),
        };

        Ok(Self {
            raw: input.to_string(),
            did,
            path,
            query,
            fragment,
        })
    }

    /// The base DID this URL points into.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// Path component, including the leading `/`.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Query component, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Fragment component, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The URL exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for DidUrl {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
