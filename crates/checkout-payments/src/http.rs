//! Shared response handling for the provider clients

use std::time::Duration;

use checkout_core::{CheckoutError, Result};
use serde::de::DeserializeOwned;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CheckoutError::Config(format!("HTTP client: {e}")))
}

pub(crate) fn network(operation: &str, err: reqwest::Error) -> CheckoutError {
    CheckoutError::Network(format!("{operation}: {err}"))
}

/// Fail non-2xx responses with status and body text, decode the rest
pub(crate) async fn decode<T: DeserializeOwned>(
    operation: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(operation, status = status.as_u16(), body = %body, "Provider rejected request");
        return Err(CheckoutError::provider(operation, status.as_u16(), body));
    }

    let bytes = response.bytes().await.map_err(|e| network(operation, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CheckoutError::UnexpectedResponse(format!("{operation}: {e}")))
}
