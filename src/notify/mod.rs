//! Fire-and-forget payee notifications.
//!
//! Dispatch failures are logged and never propagate: a notification that
//! cannot be delivered must not roll back a money-moving operation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::schema::NotificationConfig;
use crate::schedule::types::{RecurringPaymentSchedule, ScheduleStatus};

#[derive(Debug, Clone, Serialize)]
struct ScheduleEvent {
    event: String,
    schedule_id: Uuid,
    payee_address: String,
    status: ScheduleStatus,
    timestamp: DateTime<Utc>,
}

/// Webhook dispatcher for schedule lifecycle events.
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(config: &NotificationConfig) -> Self {
        let webhook_url = match &config.webhook_url {
            Some(raw) => match raw.parse::<url::Url>() {
                Ok(_) => Some(raw.clone()),
                Err(e) => {
                    tracing::warn!(url = %raw, error = %e, "Invalid notification webhook URL, notifications disabled");
                    None
                }
            },
            None => None,
        };
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// A notifier that drops every event.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: None,
        }
    }

    /// Dispatch a schedule event without waiting for delivery.
    pub fn schedule_event(&self, event: &str, schedule: &RecurringPaymentSchedule) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!(event = %event, schedule_id = %schedule.id, "Notifications disabled, dropping event");
            return;
        };

        let body = ScheduleEvent {
            event: event.to_string(),
            schedule_id: schedule.id,
            payee_address: schedule.payee_address.clone(),
            status: schedule.status,
            timestamp: Utc::now(),
        };
        let http = self.http.clone();

        tokio::spawn(async move {
            match http.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(event = %body.event, schedule_id = %body.schedule_id, "Notification delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        event = %body.event,
                        schedule_id = %body.schedule_id,
                        status = %response.status(),
                        "Notification endpoint rejected event"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        event = %body.event,
                        schedule_id = %body.schedule_id,
                        error = %e,
                        "Notification dispatch failed"
                    );
                }
            }
        });
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.webhook_url.is_some())
            .finish()
    }
}
