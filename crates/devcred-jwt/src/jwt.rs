use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use devcred_crypto::Signer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::JwtError;

/// The only `typ` accepted.
pub const JWT_TYPE: &str = "JWT";

/// JOSE header of a DID-anchored token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    #[serde(default)]
    pub typ: String,
    #[serde(default)]
    pub alg: String,
    /// DID URL of the signing verification method.
    #[serde(default)]
    pub kid: String,
}

impl JwtHeader {
    /// A `typ: JWT` header.
    pub fn new(alg: impl Into<String>, kid: impl Into<String>) -> Self {
        Self {
            typ: JWT_TYPE.to_string(),
            alg: alg.into(),
            kid: kid.into(),
        }
    }

    /// `typ` must be `JWT`; `alg` and `kid` must be non-empty.
    pub fn validate(&self) -> Result<(), JwtError> {
        if self.typ != JWT_TYPE {
            return Err(JwtError::MalformedJwt(format!(
                "typ must be '{}', got '{}'",
                JWT_TYPE, self.typ
            )));
        }
        if self.alg.is_empty() {
            return Err(JwtError::MalformedJwt("header is missing 'alg'".into()));
        }
        if self.kid.is_empty() {
            return Err(JwtError::MalformedJwt("header is missing 'kid'".into()));
        }
        Ok(())
    }
}

/// A compact JWT split into its segments, with header and payload decoded.
#[derive(Debug, Clone)]
pub struct CompactJwt {
    header_b64: String,
    payload_b64: String,
    signature_b64: String,
    pub header: JwtHeader,
    pub payload: Map<String, Value>,
}

impl CompactJwt {
    /// Split `token` into exactly three segments and decode the header and
    /// payload as JSON objects.
    pub fn parse(token: &str) -> Result<Self, JwtError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
            return Err(JwtError::MalformedJwt(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        };

        let header = serde_json::from_value(decode_object(header_b64, "header")?)
            .map_err(|e| JwtError::MalformedJwt(format!("header: {}", e)))?;
        let Value::Object(payload) = decode_object(payload_b64, "payload")? else {
            return Err(JwtError::MalformedJwt("payload is not a JSON object".into()));
        };

        Ok(Self {
            header_b64: header_b64.to_string(),
            payload_b64: payload_b64.to_string(),
            signature_b64: signature_b64.to_string(),
            header,
            payload,
        })
    }

    /// `header_b64 + "." + payload_b64`, exactly as received.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_b64, self.payload_b64)
    }

    /// Raw signature bytes. A segment that is not base64url cannot match any
    /// key, so it is reported as a mismatch.
    pub fn signature(&self) -> Result<Vec<u8>, JwtError> {
        URL_SAFE_NO_PAD
            .decode(&self.signature_b64)
            .map_err(|_| JwtError::SignatureMismatch)
    }
}

fn decode_object(segment: &str, name: &str) -> Result<Value, JwtError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| JwtError::MalformedJwt(format!("{} is not base64url", name)))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| JwtError::MalformedJwt(format!("{} is not JSON: {}", name, e)))?;
    if !value.is_object() {
        return Err(JwtError::MalformedJwt(format!("{} is not a JSON object", name)));
    }
    Ok(value)
}

/// Sign `claims` into a compact JWT. `header.alg` must be the signer's algorithm.
pub fn encode_jwt(
    header: &JwtHeader,
    claims: &Map<String, Value>,
    signer: &dyn Signer,
) -> Result<String, JwtError> {
    if header.alg != signer.algorithm() {
        return Err(JwtError::UnsupportedAlgorithm(format!(
            "header alg '{}' but key signs {}",
            header.alg,
            signer.algorithm()
        )));
    }
    let header_json = serde_json::to_vec(header).map_err(|e| JwtError::Signing(e.to_string()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| JwtError::Signing(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = signer
        .sign(signing_input.as_bytes())
        .map_err(|e| JwtError::Signing(e.to_string()))?;

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcred_crypto::KeyPair;
    use serde_json::json;

    fn b64(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn claims() -> Map<String, Value> {
        let Value::Object(map) = json!({"jti": "code-123", "iat": 1_700_000_000}) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn test_encode_then_parse() {
        let kp = KeyPair::generate();
        let header = JwtHeader::new("EdDSA", "did:example:123#key-1");
        let token = encode_jwt(&header, &claims(), &kp).unwrap();

        let jwt = CompactJwt::parse(&token).unwrap();
        assert_eq!(jwt.header, header);
        assert_eq!(jwt.payload["jti"], "code-123");
        assert_eq!(jwt.signature().unwrap().len(), 64);
        assert!(token.starts_with(&jwt.signing_input()));
    }

    #[test]
    fn test_encode_rejects_alg_mismatch() {
        let kp = KeyPair::generate();
        let header = JwtHeader::new("ES256K", "did:example:123#key-1");
        assert!(matches!(
            encode_jwt(&header, &claims(), &kp),
            Err(JwtError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_segment_count() {
        for token in ["", "a", "a.b", "a.b.c.d", "a.b.c.d.e"] {
            assert!(
                matches!(CompactJwt::parse(token), Err(JwtError::MalformedJwt(_))),
                "{:?} was accepted",
                token
            );
        }
    }

    #[test]
    fn test_header_not_base64() {
        let token = format!("!!!.{}.sig", b64(&json!({})));
        assert!(matches!(CompactJwt::parse(&token), Err(JwtError::MalformedJwt(_))));
    }

    #[test]
    fn test_header_not_object() {
        let token = format!("{}.{}.sig", b64(&json!(["JWT", "EdDSA", "kid"])), b64(&json!({})));
        assert!(matches!(CompactJwt::parse(&token), Err(JwtError::MalformedJwt(_))));
    }

    #[test]
    fn test_payload_not_object() {
        let token = format!("{}.{}.sig", b64(&json!({"typ": "JWT"})), b64(&json!("claims")));
        assert!(matches!(CompactJwt::parse(&token), Err(JwtError::MalformedJwt(_))));
    }

    #[test]
    fn test_header_validation() {
        assert!(JwtHeader::new("EdDSA", "did:example:123#key-1").validate().is_ok());

        let missing_alg = JwtHeader::new("", "did:example:123#key-1");
        assert!(matches!(missing_alg.validate(), Err(JwtError::MalformedJwt(_))));

        let missing_kid = JwtHeader::new("EdDSA", "");
        assert!(matches!(missing_kid.validate(), Err(JwtError::MalformedJwt(_))));

        let wrong_typ = JwtHeader {
            typ: "at+jwt".into(),
            ..JwtHeader::new("EdDSA", "did:example:123#key-1")
        };
        assert!(matches!(wrong_typ.validate(), Err(JwtError::MalformedJwt(_))));
    }

    #[test]
    fn test_absent_header_fields_default_empty() {
        let token = format!("{}.{}.sig", b64(&json!({"typ": "JWT"})), b64(&json!({})));
        let jwt = CompactJwt::parse(&token).unwrap();
        assert_eq!(jwt.header.alg, "");
        assert!(jwt.header.validate().is_err());
    }

    #[test]
    fn test_undecodable_signature_is_mismatch() {
        let token = format!("{}.{}.%%%", b64(&json!({"typ": "JWT"})), b64(&json!({})));
        let jwt = CompactJwt::parse(&token).unwrap();
        assert!(matches!(jwt.signature(), Err(JwtError::SignatureMismatch)));
    }
}
