//! Typed signing material issued by the custody provider.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Raw secret bytes with a tagged wire encoding.
///
/// Serializes as `{"kind": "bytes", "payload": "<hex>"}` so that a
/// decrypt→deserialize round trip can never hand back an integer-keyed
/// object where a byte sequence is expected. The discriminant is chosen at
/// encryption time; decoding anything else is an error, not a guess.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// Key bytes must never end up in logs or panic messages.
impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes(<{} bytes>)", self.0.len())
    }
}

impl Serialize for SecretBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SecretBytes", 2)?;
        state.serialize_field("kind", "bytes")?;
        state.serialize_field("payload", &hex::encode(&self.0))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for SecretBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Tagged {
            kind: String,
            payload: String,
        }

        let tagged = Tagged::deserialize(deserializer)?;
        if tagged.kind != "bytes" {
            return Err(de::Error::custom(format!(
                "expected tagged byte encoding, got kind {:?}",
                tagged.kind
            )));
        }
        let bytes = hex::decode(&tagged.payload)
            .map_err(|e| de::Error::custom(format!("invalid byte payload: {e}")))?;
        Ok(Self(bytes))
    }
}

/// One provider-tagged key pair inside a signing credential.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KeyShareRecord {
    /// Which custody provider issued this key pair.
    pub provider: String,
    /// Public half, as the provider encodes it.
    pub public_key: String,
    /// Raw private key bytes, tagged encoding.
    pub private_key: SecretBytes,
}

/// Per-user key material issued once at successful authentication.
///
/// Exclusively owned by one user, consumed read-only by every signing
/// call, and replaced wholesale on re-authentication.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SigningCredential {
    pub keys: Vec<KeyShareRecord>,
}

/// Opaque provider-issued session state returned alongside the credential.
///
/// Must accompany the credential on every signing call; same lifecycle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AuthorizationSession(pub serde_json::Value);

/// The decrypted credential/session pair handed to the signing client.
///
/// The pair is atomic: a bundle with an empty credential or a null session
/// does not authorize anything and is rejected before any provider call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CredentialBundle {
    pub credential: SigningCredential,
    pub session: AuthorizationSession,
}

impl CredentialBundle {
    pub fn is_complete(&self) -> bool {
        !self.credential.keys.is_empty() && !self.session.0.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_bytes_tagged_encoding() {
        let secret = SecretBytes::from(vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_value(&secret).unwrap();
        assert_eq!(json, json!({"kind": "bytes", "payload": "deadbeef"}));

        let back: SecretBytes = serde_json::from_value(json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_secret_bytes_rejects_untagged_shapes() {
        // An integer-keyed object is exactly the mis-serialized buffer
        // shape the tagged encoding exists to rule out.
        let shape = json!({"0": 237, "1": 5, "2": 0});
        assert!(serde_json::from_value::<SecretBytes>(shape).is_err());

        let wrong_kind = json!({"kind": "json", "payload": "00"});
        assert!(serde_json::from_value::<SecretBytes>(wrong_kind).is_err());
    }

    #[test]
    fn test_secret_bytes_debug_is_redacted() {
        let secret = SecretBytes::from(vec![1, 2, 3]);
        let rendered = format!("{:?}", secret);
        assert_eq!(rendered, "SecretBytes(<3 bytes>)");
    }

    #[test]
    fn test_bundle_completeness() {
        let complete = CredentialBundle {
            credential: SigningCredential {
                keys: vec![KeyShareRecord {
                    provider: "mpc".to_string(),
                    public_key: "pk".to_string(),
                    private_key: SecretBytes::from(vec![0u8; 32]),
                }],
            },
            session: AuthorizationSession(json!({"token": "t"})),
        };
        assert!(complete.is_complete());

        let no_keys = CredentialBundle {
            credential: SigningCredential { keys: vec![] },
            session: AuthorizationSession(json!({"token": "t"})),
        };
        assert!(!no_keys.is_complete());

        let null_session = CredentialBundle {
            credential: complete.credential.clone(),
            session: AuthorizationSession(serde_json::Value::Null),
        };
        assert!(!null_session.is_complete());
    }
}
