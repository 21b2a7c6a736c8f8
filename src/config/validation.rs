//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones, run before a config
//! is accepted into the system. Validation is a pure function and returns
//! every violation, not just the first.

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// One semantic violation in a configuration file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("provider.base_url '{0}' is not a valid http(s) URL")]
    InvalidBaseUrl(String),

    #[error("provider.{0} must be greater than zero")]
    ZeroProviderValue(&'static str),

    #[error("provider.submit_backoff_base_ms must not exceed submit_backoff_max_ms")]
    BackoffRangeInverted,

    #[error("{0} must name a non-empty environment variable")]
    EmptyEnvName(&'static str),

    #[error("scheduling.execution_hour_utc must be below 24, got {0}")]
    InvalidExecutionHour(u32),

    #[error("scheduling.asset_decimals must be at most 18, got {0}")]
    TooManyDecimals(u32),

    #[error("scheduling.minimum_transfer_units must be greater than zero")]
    ZeroMinimumTransfer,

    #[error("reconciliation.{0} must be greater than zero")]
    ZeroReconciliationValue(&'static str),

    #[error("notifications.webhook_url '{0}' is not a valid URL")]
    InvalidWebhookUrl(String),
}

fn valid_http_url(raw: &str) -> bool {
    raw.parse::<url::Url>()
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Validate a configuration, collecting all violations.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !valid_http_url(&config.provider.base_url) {
        errors.push(ValidationError::InvalidBaseUrl(
            config.provider.base_url.clone(),
        ));
    }
    if config.provider.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroProviderValue("request_timeout_secs"));
    }
    if config.provider.submit_max_attempts == 0 {
        errors.push(ValidationError::ZeroProviderValue("submit_max_attempts"));
    }
    if config.provider.submit_backoff_base_ms > config.provider.submit_backoff_max_ms {
        errors.push(ValidationError::BackoffRangeInverted);
    }
    if config.provider.api_key_env.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvName("provider.api_key_env"));
    }

    if config.vault.key_env.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvName("vault.key_env"));
    }

    if config.scheduling.execution_hour_utc >= 24 {
        errors.push(ValidationError::InvalidExecutionHour(
            config.scheduling.execution_hour_utc,
        ));
    }
    if config.scheduling.asset_decimals > 18 {
        errors.push(ValidationError::TooManyDecimals(
            config.scheduling.asset_decimals,
        ));
    }
    if config.scheduling.minimum_transfer_units == 0 {
        errors.push(ValidationError::ZeroMinimumTransfer);
    }

    if config.reconciliation.interval_secs == 0 {
        errors.push(ValidationError::ZeroReconciliationValue("interval_secs"));
    }
    if config.reconciliation.max_concurrent_fetches == 0 {
        errors.push(ValidationError::ZeroReconciliationValue(
            "max_concurrent_fetches",
        ));
    }

    if let Some(url) = &config.notifications.webhook_url {
        if !valid_http_url(url) {
            errors.push(ValidationError::InvalidWebhookUrl(url.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut config = GatewayConfig::default();
        config.provider.base_url = "not a url".to_string();
        config.scheduling.execution_hour_utc = 24;
        config.reconciliation.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidExecutionHour(24)));
    }

    #[test]
    fn test_backoff_range_check() {
        let mut config = GatewayConfig::default();
        config.provider.submit_backoff_base_ms = 10_000;
        config.provider.submit_backoff_max_ms = 5_000;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BackoffRangeInverted));
    }

    #[test]
    fn test_webhook_url_checked_only_when_present() {
        let mut config = GatewayConfig::default();
        config.notifications.webhook_url = Some("nope".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidWebhookUrl(_)));

        config.notifications.webhook_url = None;
        assert!(validate_config(&config).is_ok());
    }
}
