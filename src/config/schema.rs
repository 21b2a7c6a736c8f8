//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files. Secrets are referenced by environment-variable name only and
//! never appear in the file itself.

use serde::{Deserialize, Serialize};

/// Root configuration for the custody gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Custody provider connection settings.
    pub provider: ProviderConfig,

    /// Credential vault settings.
    pub vault: VaultConfig,

    /// Standing order policy (asset, thresholds, execution window).
    pub scheduling: SchedulingConfig,

    /// Periodic reconciliation settings.
    pub reconciliation: ReconciliationConfig,

    /// Payee notification settings.
    pub notifications: NotificationConfig,
}

/// Custody provider connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider API.
    pub base_url: String,

    /// Name of the environment variable holding the privileged API key.
    pub api_key_env: String,

    /// Deadline for each provider request.
    pub request_timeout_secs: u64,

    /// Submit-phase attempts, including the first.
    pub submit_max_attempts: u32,

    /// Base backoff delay between submit attempts.
    pub submit_backoff_base_ms: u64,

    /// Backoff delay cap.
    pub submit_backoff_max_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7070".to_string(),
            api_key_env: "CUSTODY_PROVIDER_API_KEY".to_string(),
            request_timeout_secs: 10,
            submit_max_attempts: 3,
            submit_backoff_base_ms: 250,
            submit_backoff_max_ms: 5_000,
        }
    }
}

/// Credential vault settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Name of the environment variable holding the hex-encoded 256-bit
    /// vault key.
    pub key_env: String,

    /// Optional snapshot path for the encrypted credential store.
    pub credential_store_path: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_env: "CUSTODY_VAULT_KEY".to_string(),
            credential_store_path: None,
        }
    }
}

/// Standing order policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Settlement asset symbol.
    pub asset: String,

    /// Decimal places of the asset's smallest unit.
    pub asset_decimals: u32,

    /// Minimum transfer, in smallest units.
    pub minimum_transfer_units: u64,

    /// Hour of day (UTC) schedules execute; the provider's recommended
    /// window.
    pub execution_hour_utc: u32,

    /// Optional snapshot path for the schedule store.
    pub store_path: Option<String>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            asset: "USDC".to_string(),
            asset_decimals: 6,
            minimum_transfer_units: 1_000_000,
            execution_hour_utc: 10,
            store_path: None,
        }
    }
}

/// Periodic reconciliation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Seconds between reconciliation passes.
    pub interval_secs: u64,

    /// Bounded parallelism for provider fetches within one pass.
    pub max_concurrent_fetches: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            max_concurrent_fetches: 8,
        }
    }
}

/// Payee notification settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NotificationConfig {
    /// Webhook endpoint for schedule events. Absent = notifications off.
    pub webhook_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = GatewayConfig::default();
        assert_eq!(config.provider.request_timeout_secs, 10);
        assert_eq!(config.scheduling.asset_decimals, 6);
        assert_eq!(config.scheduling.execution_hour_utc, 10);
        assert_eq!(config.reconciliation.interval_secs, 300);
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let raw = r#"
            [provider]
            base_url = "https://custody.example.com/api"

            [scheduling]
            minimum_transfer_units = 5000000
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.provider.base_url, "https://custody.example.com/api");
        assert_eq!(config.provider.submit_max_attempts, 3);
        assert_eq!(config.scheduling.minimum_transfer_units, 5_000_000);
        assert_eq!(config.scheduling.asset, "USDC");
    }
}
