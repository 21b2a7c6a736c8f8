//! Standing order lifecycle orchestration.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use uuid::Uuid;

use crate::config::schema::SchedulingConfig;
use crate::notify::Notifier;
use crate::provider::types::{ProviderError, ScheduleSubmission, UnsignedPayload};
use crate::provider::PrivilegedApi;
use crate::schedule::reconcile;
use crate::schedule::store::ScheduleStore;
use crate::schedule::types::{
    ActivationError, CreateScheduleRequest, CreatedSchedule, ReconcileError, ReconcileSummary,
    RecurringPaymentSchedule, ScheduleError, ScheduleStatus, ValidationError,
};
use crate::schedule::validation;
use crate::signing::TransferSigner;
use crate::vault::Vault;

/// Creates, activates, and reconciles recurring payment schedules.
pub struct ScheduleManager {
    provider: Arc<dyn PrivilegedApi>,
    signer: Arc<TransferSigner>,
    vault: Arc<Vault>,
    store: ScheduleStore,
    notifier: Notifier,
    scheduling: SchedulingConfig,
    reconcile_concurrency: usize,
}

impl ScheduleManager {
    pub fn new(
        provider: Arc<dyn PrivilegedApi>,
        signer: Arc<TransferSigner>,
        vault: Arc<Vault>,
        store: ScheduleStore,
        notifier: Notifier,
        scheduling: SchedulingConfig,
        reconcile_concurrency: usize,
    ) -> Self {
        Self {
            provider,
            signer,
            vault,
            store,
            notifier,
            scheduling,
            reconcile_concurrency: reconcile_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    /// Create a standing order.
    ///
    /// Validation and normalization run before the first provider call.
    /// If the provider returns an activation payload, signing it is
    /// mandatory: on activation failure the schedule exists remotely but
    /// is not authorized on-chain, so a degraded record is persisted under
    /// `ActivationFailed` and the error is surfaced — never plain success.
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> Result<CreatedSchedule, ScheduleError> {
        let now = Utc::now();

        let destination = self.resolve_payee(&request).await?;
        let units =
            validation::normalize_amount(&request.amount, self.scheduling.asset_decimals)?;
        validation::check_minimum(units, self.scheduling.minimum_transfer_units)?;

        let hour = self.scheduling.execution_hour_utc;
        let start = validation::normalize_start(request.start, now, hour);
        let end = validation::resolve_end(start, request.end, request.frequency, hour)?;

        let mut record = RecurringPaymentSchedule {
            id: Uuid::new_v4(),
            owner: request.owner,
            payer_account: request.payer_account.clone(),
            payee_address: destination.clone(),
            amount_units: units,
            asset: self.scheduling.asset.clone(),
            frequency: request.frequency,
            start,
            end,
            external_id: None,
            next_execution: None,
            status: ScheduleStatus::Validating,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(schedule_id = %record.id, amount_units = units, "Schedule request validated");

        let submission = ScheduleSubmission {
            amount: units,
            source: request.payer_account.clone(),
            destination,
            frequency: request.frequency,
            start_date: start,
            end_date: end,
        };
        let created = self
            .provider
            .create_recurring_schedule(&request.payer_account, &submission)
            .await?;
        record.status = ScheduleStatus::SubmittedToProvider;
        record.external_id = Some(created.external_id.clone());
        record.next_execution = created.next_execution_date;
        tracing::debug!(
            schedule_id = %record.id,
            external_id = %created.external_id,
            "Schedule accepted by provider"
        );

        if let Some(activation) = &created.activation_payload {
            record.status = ScheduleStatus::Activating;
            if let Err(source) = self
                .activate(request.owner, activation, &request.payer_account)
                .await
            {
                record.status = ScheduleStatus::ActivationFailed;
                record.updated_at = Utc::now();
                self.store.upsert(record.clone());
                self.persist();
                tracing::error!(
                    schedule_id = %record.id,
                    external_id = %created.external_id,
                    error = %source,
                    "Provider accepted schedule but activation failed; degraded record persisted"
                );
                return Err(ScheduleError::ActivationFailed {
                    external_id: created.external_id,
                    source,
                });
            }
        }

        record.status = ScheduleStatus::Active;
        record.updated_at = Utc::now();
        self.store.upsert(record.clone());
        self.persist();
        tracing::info!(
            schedule_id = %record.id,
            external_id = %created.external_id,
            frequency = ?record.frequency,
            "Standing order active"
        );
        self.notifier.schedule_event("schedule_created", &record);

        Ok(CreatedSchedule {
            schedule_id: record.id,
            external_id: created.external_id,
            next_execution: record.next_execution,
        })
    }

    async fn activate(
        &self,
        owner: Uuid,
        payload: &UnsignedPayload,
        account: &str,
    ) -> Result<(), ActivationError> {
        let bundle = self.vault.load_bundle(owner)?;
        let receipt = self.signer.sign_and_submit(payload, &bundle, account).await?;
        tracing::debug!(signature = %receipt.signature, "Schedule activation submitted");
        Ok(())
    }

    async fn resolve_payee(&self, request: &CreateScheduleRequest) -> Result<String, ScheduleError> {
        match (&request.payee_email, &request.destination_address) {
            (Some(_), Some(_)) | (None, None) => Err(ValidationError::PayeeSelection.into()),
            (None, Some(address)) => Ok(address.clone()),
            (Some(email), None) => {
                let account = match self.provider.get_account(email).await {
                    Ok(account) => account,
                    Err(ProviderError::Status { code: 404, .. }) => {
                        return Err(ValidationError::PayeeNotOnboarded(email.clone()).into())
                    }
                    Err(e) => return Err(ScheduleError::Provider(e)),
                };
                if account.address.is_empty() || account.public_key.is_none() {
                    return Err(ValidationError::PayeeNotOnboarded(email.clone()).into());
                }
                Ok(account.address)
            }
        }
    }

    /// Pause a schedule locally.
    ///
    /// Local tracking only: the provider has no pause primitive, so the
    /// remote schedule keeps executing. The schedule is merely excluded
    /// from reconciliation until resumed.
    pub fn pause_schedule(&self, id: Uuid) -> Result<(), ScheduleError> {
        self.transition(id, ScheduleStatus::Paused, "schedule_paused")?;
        tracing::warn!(
            schedule_id = %id,
            "Schedule paused locally only; the provider schedule keeps executing"
        );
        Ok(())
    }

    /// Resume a locally paused schedule.
    pub fn resume_schedule(&self, id: Uuid) -> Result<(), ScheduleError> {
        self.transition(id, ScheduleStatus::Active, "schedule_resumed")
    }

    /// Stop a schedule locally. Terminal; records are never deleted.
    ///
    /// Like pause, this does not call the provider.
    pub fn stop_schedule(&self, id: Uuid) -> Result<(), ScheduleError> {
        self.transition(id, ScheduleStatus::Stopped, "schedule_stopped")
    }

    fn transition(
        &self,
        id: Uuid,
        requested: ScheduleStatus,
        event: &str,
    ) -> Result<(), ScheduleError> {
        let mut record = self.store.get(&id).ok_or(ScheduleError::NotFound(id))?;

        let allowed = matches!(
            (record.status, requested),
            (ScheduleStatus::Active, ScheduleStatus::Paused)
                | (ScheduleStatus::Paused, ScheduleStatus::Active)
                | (
                    ScheduleStatus::Active | ScheduleStatus::Paused,
                    ScheduleStatus::Stopped
                )
        );
        if !allowed {
            return Err(ScheduleError::InvalidTransition {
                id,
                from: record.status,
                requested,
            });
        }

        record.status = requested;
        record.updated_at = Utc::now();
        self.store.upsert(record.clone());
        self.persist();
        self.notifier.schedule_event(event, &record);
        Ok(())
    }

    /// Run one reconciliation pass over locally active schedules.
    ///
    /// Idempotent read-then-overwrite-with-latest: safe to run
    /// concurrently with itself. A per-schedule failure never aborts the
    /// rest of the batch.
    pub async fn reconcile_now(&self) -> ReconcileSummary {
        let candidates = self.store.reconcilable();
        let mut summary = ReconcileSummary {
            examined: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return summary;
        }

        let provider = Arc::clone(&self.provider);
        let results = stream::iter(candidates.into_iter().map(|schedule| {
            let provider = Arc::clone(&provider);
            async move {
                // reconcilable() guarantees an external id
                let external_id = schedule.external_id.clone().unwrap_or_default();
                match provider
                    .get_recurring_schedule(&schedule.payer_account, &external_id)
                    .await
                {
                    Ok(state) => Ok((schedule, state)),
                    Err(source) => Err(ReconcileError::Fetch {
                        schedule_id: schedule.id,
                        source,
                    }),
                }
            }
        }))
        .buffer_unordered(self.reconcile_concurrency)
        .collect::<Vec<_>>()
        .await;

        let now = Utc::now();
        for result in results {
            let (mut schedule, state) = match result {
                Ok(pair) => pair,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(error = %e, "Reconciliation skipped schedule");
                    continue;
                }
            };
            match reconcile::apply_provider_state(&mut schedule, &state, now) {
                Ok(transitioned) => {
                    summary.updated += 1;
                    if transitioned {
                        summary.transitioned += 1;
                        self.notifier.schedule_event("schedule_reconciled", &schedule);
                    }
                    self.store.upsert(schedule);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(error = %e, "Reconciliation skipped schedule");
                }
            }
        }

        self.persist();
        tracing::info!(
            examined = summary.examined,
            updated = summary.updated,
            transitioned = summary.transitioned,
            failed = summary.failed,
            "Reconciliation pass complete"
        );
        summary
    }

    fn persist(&self) {
        if let Err(e) = self.store.save_to_file() {
            tracing::warn!(error = %e, "Failed to snapshot schedule store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::schedule::types::Frequency;

    fn stored_schedule(store: &ScheduleStore, status: ScheduleStatus) -> Uuid {
        let now = Utc::now();
        let record = RecurringPaymentSchedule {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            payer_account: "acct-src".to_string(),
            payee_address: "addr-dst".to_string(),
            amount_units: 50_000_000,
            asset: "USDC".to_string(),
            frequency: Frequency::Monthly,
            start: now + Duration::days(1),
            end: now + Duration::days(91),
            external_id: Some("ext-1".to_string()),
            next_execution: None,
            status,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        store.upsert(record);
        id
    }

    fn manager_with_store(store: ScheduleStore) -> ScheduleManager {
        use crate::provider::types::*;
        use crate::resilience::RetryPolicy;
        use crate::vault::{CredentialStore, Vault, VaultCipher};
        use async_trait::async_trait;

        struct NoProvider;

        #[async_trait]
        impl PrivilegedApi for NoProvider {
            async fn prepare_transfer(
                &self,
                _request: &PrepareRequest,
            ) -> Result<UnsignedPayload, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
            async fn create_recurring_schedule(
                &self,
                _account: &str,
                _submission: &ScheduleSubmission,
            ) -> Result<CreateScheduleResponse, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
            async fn get_recurring_schedule(
                &self,
                _account: &str,
                _external_id: &str,
            ) -> Result<ProviderScheduleState, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
            async fn list_transfers(
                &self,
                _account: &str,
            ) -> Result<Vec<TransferRecord>, ProviderError> {
                Ok(vec![])
            }
            async fn get_account(&self, _lookup: &str) -> Result<ProviderAccount, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
        }

        struct NoSigning;

        #[async_trait]
        impl crate::provider::SigningApi for NoSigning {
            async fn sign(
                &self,
                _payload: &UnsignedPayload,
                _bundle: &crate::vault::material::CredentialBundle,
            ) -> Result<SignedPayload, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
            async fn submit(
                &self,
                _account: &str,
                _signed: &SignedPayload,
            ) -> Result<SubmitReceipt, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
            async fn sign_and_submit(
                &self,
                _payload: &UnsignedPayload,
                _bundle: &crate::vault::material::CredentialBundle,
                _account: &str,
            ) -> Result<SubmitReceipt, ProviderError> {
                Err(ProviderError::Transport("unused".into()))
            }
        }

        let provider: Arc<dyn PrivilegedApi> = Arc::new(NoProvider);
        let signing: Arc<dyn crate::provider::SigningApi> = Arc::new(NoSigning);
        let signer = Arc::new(TransferSigner::new(
            Arc::clone(&provider),
            signing,
            RetryPolicy::default(),
        ));
        let vault = Arc::new(Vault::new(
            VaultCipher::new([1u8; 32]),
            CredentialStore::new(None),
        ));
        ScheduleManager::new(
            provider,
            signer,
            vault,
            store,
            Notifier::disabled(),
            SchedulingConfig::default(),
            4,
        )
    }

    #[test]
    fn test_pause_resume_roundtrip() {
        let store = ScheduleStore::new(None);
        let id = stored_schedule(&store, ScheduleStatus::Active);
        let manager = manager_with_store(store);

        manager.pause_schedule(id).unwrap();
        assert_eq!(
            manager.store().get(&id).unwrap().status,
            ScheduleStatus::Paused
        );

        manager.resume_schedule(id).unwrap();
        assert_eq!(
            manager.store().get(&id).unwrap().status,
            ScheduleStatus::Active
        );
    }

    #[test]
    fn test_stop_is_terminal() {
        let store = ScheduleStore::new(None);
        let id = stored_schedule(&store, ScheduleStatus::Active);
        let manager = manager_with_store(store);

        manager.stop_schedule(id).unwrap();

        let err = manager.resume_schedule(id).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTransition { .. }));
        let err = manager.pause_schedule(id).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTransition { .. }));
        assert_eq!(
            manager.store().get(&id).unwrap().status,
            ScheduleStatus::Stopped
        );
    }

    #[test]
    fn test_degraded_schedule_cannot_be_paused() {
        let store = ScheduleStore::new(None);
        let id = stored_schedule(&store, ScheduleStatus::ActivationFailed);
        let manager = manager_with_store(store);

        let err = manager.pause_schedule(id).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTransition { .. }));
    }

    #[test]
    fn test_unknown_schedule_is_not_found() {
        let manager = manager_with_store(ScheduleStore::new(None));
        let err = manager.pause_schedule(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_payee_selection_requires_exactly_one() {
        let manager = manager_with_store(ScheduleStore::new(None));
        let base = CreateScheduleRequest {
            owner: Uuid::new_v4(),
            payer_account: "acct-src".to_string(),
            payee_email: None,
            destination_address: None,
            amount: "50.00".to_string(),
            frequency: Frequency::Monthly,
            start: Utc::now() + Duration::days(2),
            end: None,
        };

        let err = manager.create_schedule(base.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Validation(ValidationError::PayeeSelection)
        ));

        let both = CreateScheduleRequest {
            payee_email: Some("payee@example.com".to_string()),
            destination_address: Some("addr-dst".to_string()),
            ..base
        };
        let err = manager.create_schedule(both).await.unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Validation(ValidationError::PayeeSelection)
        ));
    }
}
