use devcred_crypto::Jwk;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Base DID Core JSON-LD context.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
/// Context for `JsonWebKey2020` verification methods.
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";
/// Verification method type carrying a `publicKeyJwk`.
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method identifier: a full DID URL, a bare fragment, or
    /// `#fragment`.
    pub id: String,
    /// Type of the verification method (e.g. "JsonWebKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// Public key material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

/// A service endpoint in a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    /// A URL string, a map or a list; kept as raw JSON.
    pub service_endpoint: Value,
}

/// W3C DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// The DID subject.
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<Value>,
}

impl DidDocument {
    /// Create an empty document for `id` with the DID Core and JWS 2020 contexts.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: Some(Value::from(vec![DID_CONTEXT, JWS_2020_CONTEXT])),
            id: id.into(),
            verification_method: Vec::new(),
            service: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
        }
    }

    /// Add a `JsonWebKey2020` method with id `<did>#<fragment>`, referenced
    /// from `authentication` and `assertionMethod`. Returns the method id.
    pub fn add_jwk_verification_method(&mut self, fragment: &str, jwk: Jwk) -> String {
        let vm_id = format!("{}#{}", self.id, fragment);
        self.verification_method.push(VerificationMethod {
            id: vm_id.clone(),
            method_type: JSON_WEB_KEY_2020.to_string(),
            controller: self.id.clone(),
            public_key_jwk: Some(jwk.to_public()),
        });
        self.authentication.push(Value::from(vm_id.clone()));
        self.assertion_method.push(Value::from(vm_id.clone()));
        vm_id
    }

    /// Add a service endpoint with id `<did>#<fragment>`.
    pub fn add_service(&mut self, fragment: &str, service_type: &str, endpoint: &str) {
        self.service.push(Service {
            id: format!("{}#{}", self.id, fragment),
            service_type: service_type.to_string(),
            service_endpoint: Value::from(endpoint),
        });
    }

    /// First verification method whose id names `fragment`.
    pub fn find_verification_method(
        &self,
        did_url: &str,
        fragment: &str,
    ) -> Option<&VerificationMethod> {
        self.verification_method
            .iter()
            .find(|vm| id_matches(&vm.id, did_url, fragment))
    }

    /// First service whose id names `fragment`.
    pub fn find_service(&self, did_url: &str, fragment: &str) -> Option<&Service> {
        self.service
            .iter()
            .find(|s| id_matches(&s.id, did_url, fragment))
    }
}

/// Documents write entry ids as the full DID URL, the bare fragment, or
/// `#fragment`; all three name the same entry.
fn id_matches(id: &str, did_url: &str, fragment: &str) -> bool {
    id == did_url || id == fragment || id.strip_prefix('#') == Some(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcred_crypto::KeyPair;

    fn document_with_id(vm_id: &str) -> DidDocument {
        let mut doc = DidDocument::new("did:example:123");
        doc.verification_method.push(VerificationMethod {
            id: vm_id.to_string(),
            method_type: JSON_WEB_KEY_2020.to_string(),
            controller: "did:example:123".to_string(),
            public_key_jwk: Some(KeyPair::generate().public_key().to_jwk()),
        });
        doc
    }

    #[test]
    fn test_id_forms_all_match() {
        for id in ["did:example:123#key-1", "key-1", "#key-1"] {
            let doc = document_with_id(id);
            let vm = doc.find_verification_method("did:example:123#key-1", "key-1");
            assert!(vm.is_some(), "id form {} did not match", id);
        }
    }

    #[test]
    fn test_other_fragment_does_not_match() {
        let doc = document_with_id("did:example:123#key-1");
        assert!(doc
            .find_verification_method("did:example:123#key-2", "key-2")
            .is_none());
        // prefix of the fragment is not a match
        assert!(doc
            .find_verification_method("did:example:123#key", "key")
            .is_none());
    }

    #[test]
    fn test_add_jwk_method_strips_private_key() {
        let kp = KeyPair::generate();
        let mut doc = DidDocument::new("did:example:abc");
        let id = doc.add_jwk_verification_method("0", kp.to_jwk());
        assert_eq!(id, "did:example:abc#0");
        let vm = &doc.verification_method[0];
        assert_eq!(vm.controller, "did:example:abc");
        assert!(!vm.public_key_jwk.as_ref().unwrap().is_private());
        assert_eq!(doc.assertion_method, vec![Value::from("did:example:abc#0")]);
    }

    #[test]
    fn test_add_service() {
        let mut doc = DidDocument::new("did:example:abc");
        doc.add_service("linked-domain", "LinkedDomains", "https://example.com");
        let svc = doc.find_service("did:example:abc#linked-domain", "linked-domain");
        assert_eq!(svc.unwrap().service_type, "LinkedDomains");
    }

    #[test]
    fn test_deserialize_w3c_document() {
        let doc: DidDocument = serde_json::from_value(serde_json::json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:example:123",
            "verificationMethod": [{
                "id": "#key-1",
                "type": "JsonWebKey2020",
                "controller": "did:example:123",
                "publicKeyJwk": {
                    "kty": "OKP",
                    "crv": "Ed25519",
                    "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
                }
            }],
            "service": [{
                "id": "did:example:123#hub",
                "type": "IdentityHub",
                "serviceEndpoint": { "nodes": ["https://hub.example.com"] }
            }]
        }))
        .unwrap();

        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.verification_method[0].method_type, "JsonWebKey2020");
        assert!(doc.service[0].service_endpoint.is_object());
        assert!(doc.authentication.is_empty());
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let mut doc = DidDocument::new("did:example:abc");
        doc.add_jwk_verification_method("0", KeyPair::generate().public_key().to_jwk());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("@context").is_some());
        assert!(json["verificationMethod"][0].get("publicKeyJwk").is_some());
        assert_eq!(json["verificationMethod"][0]["type"], "JsonWebKey2020");
        assert!(json.get("service").is_none());
    }
}
