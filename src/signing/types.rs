//! Transfer intents and the signing-protocol error taxonomy.

use thiserror::Error;
use uuid::Uuid;

use crate::provider::types::{PrepareRequest, ProviderError};

/// One constructed-but-unsigned money movement.
///
/// Ephemeral: lives only for a single prepare→sign→submit cycle and is
/// never persisted.
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub source_account: String,
    pub destination: String,
    pub asset: String,
    /// Fixed-point integer in the asset's smallest unit.
    pub amount_units: u64,
    /// Minted by the caller; persisted by callers needing exactly-once
    /// delivery before phase 1 runs.
    pub idempotency_key: Uuid,
}

impl TransferIntent {
    pub(crate) fn to_prepare_request(&self) -> PrepareRequest {
        PrepareRequest {
            source: self.source_account.clone(),
            destination: self.destination.clone(),
            amount: self.amount_units,
            asset: self.asset.clone(),
            idempotency_key: self.idempotency_key,
        }
    }
}

/// The sign phase failed.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The credential set does not match the account's registered signers.
    #[error("credential set does not match the account's registered signers; re-authentication required")]
    NotAuthorized,

    /// The credential/session pair was partial. The pair is atomic.
    #[error("credential bundle is incomplete; credential and session must be presented together")]
    IncompleteCredential,

    /// The provider call failed for a non-authorization reason.
    #[error("custody provider signing call failed: {0}")]
    Provider(ProviderError),
}

impl SigningError {
    pub(crate) fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Status { code: 401 | 403, .. } => SigningError::NotAuthorized,
            other => SigningError::Provider(other),
        }
    }
}

/// The submit phase failed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Permanent provider rejection. Retrying will not help.
    #[error("transfer rejected by custody provider: {reason}")]
    Rejected { reason: String },

    /// Network/timeout fault. The submit phase may be retried.
    #[error("transfer submission did not reach the custody provider: {reason}")]
    Network { reason: String },
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::Network { .. })
    }

    pub(crate) fn from_provider(err: ProviderError) -> Self {
        if err.is_retryable() {
            SubmissionError::Network {
                reason: err.to_string(),
            }
        } else {
            SubmissionError::Rejected {
                reason: err.to_string(),
            }
        }
    }
}

/// A full prepare→sign→submit cycle failed, tagged by phase.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("prepare phase failed: {0}")]
    Prepare(ProviderError),

    #[error("sign phase failed: {0}")]
    Sign(#[from] SigningError),

    #[error("submit phase failed: {0}")]
    Submit(#[from] SubmissionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_failures_map_to_not_authorized() {
        let forbidden = ProviderError::Status {
            code: 403,
            message: "signer mismatch".into(),
        };
        assert!(matches!(
            SigningError::from_provider(forbidden),
            SigningError::NotAuthorized
        ));

        let server_fault = ProviderError::Status {
            code: 500,
            message: "boom".into(),
        };
        assert!(matches!(
            SigningError::from_provider(server_fault),
            SigningError::Provider(_)
        ));
    }

    #[test]
    fn test_submission_retryability_follows_provider_class() {
        let net = SubmissionError::from_provider(ProviderError::Transport("refused".into()));
        assert!(net.is_retryable());

        let rejected = SubmissionError::from_provider(ProviderError::Status {
            code: 422,
            message: "insufficient funds".into(),
        });
        assert!(!rejected.is_retryable());
    }
}
