//! Orchestration of the prepare → sign → submit protocol.

use std::sync::Arc;

use crate::provider::types::{
    InstructionBundle, SignedPayload, SubmitReceipt, TransferRecord, UnsignedPayload,
};
use crate::provider::{PrivilegedApi, ProviderResult, SigningApi};
use crate::resilience::RetryPolicy;
use crate::signing::types::{SigningError, SubmissionError, TransferError, TransferIntent};
use crate::vault::material::CredentialBundle;

/// Drives a constructed-but-unsigned transaction through to broadcast.
///
/// Holds both provider clients, injected once at startup: the privileged
/// client is used only for prepare and history, the key-less signing
/// client for everything that touches credential material.
pub struct TransferSigner {
    privileged: Arc<dyn PrivilegedApi>,
    signing: Arc<dyn SigningApi>,
    retry: RetryPolicy,
}

impl TransferSigner {
    pub fn new(
        privileged: Arc<dyn PrivilegedApi>,
        signing: Arc<dyn SigningApi>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            privileged,
            signing,
            retry,
        }
    }

    /// Phase 1: obtain an unsigned payload scoped to the intent.
    pub async fn prepare(&self, intent: &TransferIntent) -> Result<UnsignedPayload, TransferError> {
        self.privileged
            .prepare_transfer(&intent.to_prepare_request())
            .await
            .map_err(TransferError::Prepare)
    }

    /// Phase 2: sign a prepared payload with the caller's bundle.
    pub async fn sign(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
    ) -> Result<SignedPayload, SigningError> {
        if !bundle.is_complete() {
            return Err(SigningError::IncompleteCredential);
        }
        self.signing
            .sign(payload, bundle)
            .await
            .map_err(SigningError::from_provider)
    }

    /// Phase 3: broadcast a signed payload.
    ///
    /// Network-class failures are retried with jittered backoff up to the
    /// policy's attempt cap. Permanent rejections fail immediately. The
    /// signed payload is reused across attempts; sign is never re-run.
    pub async fn submit(
        &self,
        account: &str,
        signed: &SignedPayload,
    ) -> Result<SubmitReceipt, SubmissionError> {
        let mut attempt = 1u32;
        loop {
            match self.signing.submit(account, signed).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) => {
                    let err = SubmissionError::from_provider(e);
                    if err.is_retryable() && attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_after(attempt);
                        tracing::warn!(
                            account = %account,
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Submit failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Run a complete prepare → sign → submit cycle.
    pub async fn execute(
        &self,
        intent: &TransferIntent,
        bundle: &CredentialBundle,
    ) -> Result<SubmitReceipt, TransferError> {
        let payload = self.prepare(intent).await?;
        let signed = self.sign(&payload, bundle).await?;
        let receipt = self.submit(&intent.source_account, &signed).await?;
        tracing::info!(
            source = %intent.source_account,
            destination = %intent.destination,
            amount_units = intent.amount_units,
            signature = %receipt.signature,
            "Transfer submitted"
        );
        Ok(receipt)
    }

    /// Combined sign-and-submit for flows where prepare already ran.
    ///
    /// Not retried: the provider signs inside this call, and re-running it
    /// would mint a second signature for the same payload.
    pub async fn sign_and_submit(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
        account: &str,
    ) -> Result<SubmitReceipt, TransferError> {
        if !bundle.is_complete() {
            return Err(TransferError::Sign(SigningError::IncompleteCredential));
        }
        self.signing
            .sign_and_submit(payload, bundle, account)
            .await
            .map_err(|e| match e {
                e @ crate::provider::ProviderError::Status { code: 401 | 403, .. } => {
                    TransferError::Sign(SigningError::from_provider(e))
                }
                other => TransferError::Submit(SubmissionError::from_provider(other)),
            })
    }

    /// Submit an opaque lending-protocol instruction bundle.
    ///
    /// The bundle arrives already built; it is wrapped and signed like any
    /// other prepared payload.
    pub async fn sign_and_submit_instruction(
        &self,
        instruction: &InstructionBundle,
        bundle: &CredentialBundle,
    ) -> Result<SubmitReceipt, TransferError> {
        let payload = UnsignedPayload(instruction.instructions.clone());
        self.sign_and_submit(&payload, bundle, &instruction.account_address)
            .await
    }

    /// Read-only transfer history for reconciliation.
    ///
    /// Never an input to authorization decisions.
    pub async fn transfer_history(&self, account: &str) -> ProviderResult<Vec<TransferRecord>> {
        self.privileged.list_transfers(account).await
    }
}
