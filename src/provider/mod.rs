//! Custody provider clients.
//!
//! # Data Flow
//! ```text
//! Privileged operations (API-key-bearing client):
//!     prepare transfer, create/get schedule, list transfers, get account
//!     → privileged.rs → provider HTTP API
//!
//! Signing-only operations (no API key):
//!     sign, submit, sign-and-submit
//!     → signing.rs → provider HTTP API
//! ```
//!
//! # Design Decisions
//! - Two explicitly constructed clients instead of global singletons; the
//!   signing path holds no privileged credential, so compromising it
//!   cannot exfiltrate the API key
//! - Both clients are consumed through object-safe traits so tests can
//!   substitute in-process fakes
//! - Every call has a deadline; the error vocabulary separates the
//!   retryable network class from permanent provider rejections

pub mod privileged;
pub mod signing;
pub mod types;

pub use privileged::{HttpPrivilegedClient, PrivilegedApi};
pub use signing::{HttpSigningClient, SigningApi};
pub use types::{ProviderError, ProviderResult};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::timeout;

/// Send a provider request and decode the JSON response under a deadline.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    deadline: Duration,
) -> ProviderResult<T> {
    let response = match timeout(deadline, request.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(ProviderError::Transport(e.to_string())),
        Err(_) => return Err(ProviderError::Timeout(deadline.as_secs())),
    };

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            code: status.as_u16(),
            message,
        });
    }

    match timeout(deadline, response.json::<T>()).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ProviderError::Decode(e.to_string())),
        Err(_) => Err(ProviderError::Timeout(deadline.as_secs())),
    }
}

/// Validate a configured base URL and normalize it for path formatting.
pub(crate) fn normalize_base_url(raw: &str) -> ProviderResult<String> {
    let parsed: url::Url = raw
        .parse()
        .map_err(|e| ProviderError::Transport(format!("invalid provider base URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ProviderError::Transport(format!(
            "provider base URL '{raw}' must be http or https"
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
