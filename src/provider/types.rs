//! Custody provider wire types and error vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::schedule::types::Frequency;
use crate::vault::material::{AuthorizationSession, SigningCredential};

/// Errors from custody provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection-level failure before a response arrived.
    #[error("custody provider unreachable: {0}")]
    Transport(String),

    /// The request deadline elapsed.
    #[error("custody provider request timed out after {0} seconds")]
    Timeout(u64),

    /// The provider answered with a non-success status.
    #[error("custody provider returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body did not match the expected contract.
    #[error("could not decode custody provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether this failure belongs to the retryable network class, as
    /// opposed to a permanent provider rejection.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status { code, .. } => *code >= 500,
            ProviderError::Decode(_) => false,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Unsigned payload scoped to a single transfer intent. Opaque to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedPayload(pub serde_json::Value);

/// Signed payload ready for broadcast. Opaque to us, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedPayload(pub serde_json::Value);

/// Broadcast confirmation handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub signature: String,
}

/// Body for `POST /v1/transfers/prepare`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub source: String,
    pub destination: String,
    pub amount: u64,
    pub asset: String,
    /// Caller-minted; the protocol itself provides no idempotency.
    pub idempotency_key: Uuid,
}

/// Body for `POST /v1/transactions/sign`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest<'a> {
    pub credential: &'a SigningCredential,
    pub session: &'a AuthorizationSession,
    pub payload: &'a UnsignedPayload,
}

/// Body for `POST /v1/transactions/submit`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest<'a> {
    pub account_address: &'a str,
    pub signed_payload: &'a SignedPayload,
}

/// Body for `POST /v1/transactions/sign-and-submit`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignAndSubmitRequest<'a> {
    pub credential: &'a SigningCredential,
    pub session: &'a AuthorizationSession,
    pub payload: &'a UnsignedPayload,
    pub account_address: &'a str,
}

/// Body for `POST /v1/accounts/{account}/schedules`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSubmission {
    pub amount: u64,
    pub source: String,
    pub destination: String,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Response from schedule creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleResponse {
    pub external_id: String,
    #[serde(default)]
    pub next_execution_date: Option<DateTime<Utc>>,
    pub status: String,
    /// Present when the schedule needs on-chain authorization before it
    /// will execute. Signing this is mandatory, not optional.
    #[serde(default)]
    pub activation_payload: Option<UnsignedPayload>,
}

/// The provider's current view of a schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderScheduleState {
    pub status: String,
    #[serde(default)]
    pub next_execution_date: Option<DateTime<Utc>>,
}

/// A provider account looked up by address or email.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAccount {
    pub address: String,
    #[serde(default)]
    pub public_key: Option<String>,
}

/// One historical transfer, as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub asset: String,
    pub amount: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Envelope for `GET /v1/accounts/{account}/transfers`.
#[derive(Debug, Deserialize)]
pub struct TransferHistory {
    pub transfers: Vec<TransferRecord>,
}

/// An opaque, already-built lending-protocol instruction bundle.
///
/// Encoding is out of scope here; the signing protocol wraps and submits
/// it like any other prepared payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionBundle {
    pub account_address: String,
    pub instructions: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Transport("refused".into()).is_retryable());
        assert!(ProviderError::Timeout(10).is_retryable());
        assert!(ProviderError::Status {
            code: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!ProviderError::Status {
            code: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!ProviderError::Decode("truncated".into()).is_retryable());
    }

    #[test]
    fn test_prepare_request_wire_shape() {
        let request = PrepareRequest {
            source: "acct-1".into(),
            destination: "addr-2".into(),
            amount: 50_000_000,
            asset: "USDC".into(),
            idempotency_key: Uuid::nil(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 50_000_000);
        assert!(json.get("idempotencyKey").is_some());
    }

    #[test]
    fn test_create_schedule_response_optional_activation() {
        let body = r#"{"externalId": "ext-9", "status": "active"}"#;
        let response: CreateScheduleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.external_id, "ext-9");
        assert!(response.activation_payload.is_none());
        assert!(response.next_execution_date.is_none());
    }
}
