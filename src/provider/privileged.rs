//! Privileged custody provider client.
//!
//! The only holder of the provider API key. Callable from the trusted
//! backend only; the signing path never sees this credential.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::schema::ProviderConfig;
use crate::provider::types::{
    CreateScheduleResponse, PrepareRequest, ProviderAccount, ProviderScheduleState,
    ScheduleSubmission, TransferHistory, TransferRecord, UnsignedPayload,
};
use crate::provider::{send_json, ProviderResult};

/// Operations that require the privileged API credential.
#[async_trait]
pub trait PrivilegedApi: Send + Sync {
    /// Ask the provider for an unsigned payload scoped to one intent.
    async fn prepare_transfer(&self, request: &PrepareRequest) -> ProviderResult<UnsignedPayload>;

    /// Register a recurring schedule for an account.
    async fn create_recurring_schedule(
        &self,
        account: &str,
        submission: &ScheduleSubmission,
    ) -> ProviderResult<CreateScheduleResponse>;

    /// Fetch the provider's current view of a schedule.
    async fn get_recurring_schedule(
        &self,
        account: &str,
        external_id: &str,
    ) -> ProviderResult<ProviderScheduleState>;

    /// Read-only transfer history for an account.
    async fn list_transfers(&self, account: &str) -> ProviderResult<Vec<TransferRecord>>;

    /// Look up a provider account by address or email.
    async fn get_account(&self, lookup: &str) -> ProviderResult<ProviderAccount>;
}

/// Reqwest-backed privileged client.
pub struct HttpPrivilegedClient {
    base: String,
    http: reqwest::Client,
    api_key: String,
    deadline: Duration,
}

impl HttpPrivilegedClient {
    /// Build from configuration plus the API key read from the environment
    /// at startup. The key is never logged.
    pub fn new(config: &ProviderConfig, api_key: String) -> ProviderResult<Self> {
        let base = crate::provider::normalize_base_url(&config.base_url)?;
        tracing::info!(base_url = %base, "Privileged custody client initialized");
        Ok(Self {
            base,
            http: reqwest::Client::new(),
            api_key,
            deadline: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

#[async_trait]
impl PrivilegedApi for HttpPrivilegedClient {
    async fn prepare_transfer(&self, request: &PrepareRequest) -> ProviderResult<UnsignedPayload> {
        let builder = self
            .http
            .post(format!("{}/v1/transfers/prepare", self.base))
            .bearer_auth(&self.api_key)
            .json(request);
        send_json(builder, self.deadline).await
    }

    async fn create_recurring_schedule(
        &self,
        account: &str,
        submission: &ScheduleSubmission,
    ) -> ProviderResult<CreateScheduleResponse> {
        let builder = self
            .http
            .post(format!("{}/v1/accounts/{}/schedules", self.base, account))
            .bearer_auth(&self.api_key)
            .json(submission);
        send_json(builder, self.deadline).await
    }

    async fn get_recurring_schedule(
        &self,
        account: &str,
        external_id: &str,
    ) -> ProviderResult<ProviderScheduleState> {
        let builder = self
            .http
            .get(format!(
                "{}/v1/accounts/{}/schedules/{}",
                self.base, account, external_id
            ))
            .bearer_auth(&self.api_key);
        send_json(builder, self.deadline).await
    }

    async fn list_transfers(&self, account: &str) -> ProviderResult<Vec<TransferRecord>> {
        let builder = self
            .http
            .get(format!("{}/v1/accounts/{}/transfers", self.base, account))
            .bearer_auth(&self.api_key);
        let history: TransferHistory = send_json(builder, self.deadline).await?;
        Ok(history.transfers)
    }

    async fn get_account(&self, lookup: &str) -> ProviderResult<ProviderAccount> {
        let builder = self
            .http
            .get(format!("{}/v1/accounts/{}", self.base, lookup))
            .bearer_auth(&self.api_key);
        send_json(builder, self.deadline).await
    }
}

impl std::fmt::Debug for HttpPrivilegedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPrivilegedClient")
            .field("base", &self.base)
            .field("deadline_secs", &self.deadline.as_secs())
            .finish_non_exhaustive()
    }
}
