//! Signing-only custody provider client.
//!
//! Holds no privileged API credential. The caller's decrypted credential
//! and session authorize each call on their own, so compromising this
//! path cannot exfiltrate the API key.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::schema::ProviderConfig;
use crate::provider::types::{
    SignAndSubmitRequest, SignRequest, SignedPayload, SubmitReceipt, SubmitRequest,
    UnsignedPayload,
};
use crate::provider::{send_json, ProviderResult};
use crate::vault::material::CredentialBundle;

/// Operations that require only the caller's own credential bundle.
#[async_trait]
pub trait SigningApi: Send + Sync {
    /// Sign a prepared payload with the caller's credential and session.
    async fn sign(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
    ) -> ProviderResult<SignedPayload>;

    /// Broadcast a signed payload for an account.
    async fn submit(&self, account: &str, signed: &SignedPayload) -> ProviderResult<SubmitReceipt>;

    /// Combined path for flows where prepare already ran.
    async fn sign_and_submit(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
        account: &str,
    ) -> ProviderResult<SubmitReceipt>;
}

/// Reqwest-backed signing client.
pub struct HttpSigningClient {
    base: String,
    http: reqwest::Client,
    deadline: Duration,
}

impl HttpSigningClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let base = crate::provider::normalize_base_url(&config.base_url)?;
        tracing::info!(base_url = %base, "Signing-only custody client initialized");
        Ok(Self {
            base,
            http: reqwest::Client::new(),
            deadline: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

#[async_trait]
impl SigningApi for HttpSigningClient {
    async fn sign(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
    ) -> ProviderResult<SignedPayload> {
        let body = SignRequest {
            credential: &bundle.credential,
            session: &bundle.session,
            payload,
        };
        let builder = self
            .http
            .post(format!("{}/v1/transactions/sign", self.base))
            .json(&body);
        send_json(builder, self.deadline).await
    }

    async fn submit(&self, account: &str, signed: &SignedPayload) -> ProviderResult<SubmitReceipt> {
        let body = SubmitRequest {
            account_address: account,
            signed_payload: signed,
        };
        let builder = self
            .http
            .post(format!("{}/v1/transactions/submit", self.base))
            .json(&body);
        send_json(builder, self.deadline).await
    }

    async fn sign_and_submit(
        &self,
        payload: &UnsignedPayload,
        bundle: &CredentialBundle,
        account: &str,
    ) -> ProviderResult<SubmitReceipt> {
        let body = SignAndSubmitRequest {
            credential: &bundle.credential,
            session: &bundle.session,
            payload,
            account_address: account,
        };
        let builder = self
            .http
            .post(format!("{}/v1/transactions/sign-and-submit", self.base))
            .json(&body);
        send_json(builder, self.deadline).await
    }
}

impl std::fmt::Debug for HttpSigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSigningClient")
            .field("base", &self.base)
            .field("deadline_secs", &self.deadline.as_secs())
            .finish()
    }
}
