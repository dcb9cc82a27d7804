//! Shared HTTP request helpers.
//!
//! Provide reusable request execution with unified error mapping and an
//! exponential-backoff retry wrapper for transient failures. Callers build
//! the `RequestBuilder` themselves (auth headers, timeouts, body) so the
//! helpers stay agnostic of the individual CZDS endpoints.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};

use crate::error::CzdsError;

/// Performs an HTTP request and returns the raw response.
///
/// Unified processing: sending the request, logging, mapping transport
/// errors into [`CzdsError`]. Status-code handling is left to the caller
/// because 401 has endpoint-specific meaning (token refresh).
pub async fn execute_request(
    request_builder: RequestBuilder,
    method_name: &str,
    url_or_action: &str,
) -> Result<Response, CzdsError> {
    log::debug!("[czds] {method_name} {url_or_action}");

    let response = request_builder.send().await.map_err(|e| {
        if e.is_timeout() {
            CzdsError::Timeout {
                detail: e.to_string(),
            }
        } else {
            CzdsError::NetworkError {
                detail: e.to_string(),
            }
        }
    })?;

    log::debug!("[czds] Response status: {}", response.status().as_u16());

    Ok(response)
}

/// Performs an HTTP request with retries for transient failures.
///
/// # Retry strategy
/// - Only retry transient errors (`NetworkError`, `Timeout`)
/// - Exponential backoff: 100ms, 200ms, 400ms, 800ms, ... (maximum 10 seconds)
/// - Auth rejections and unexpected statuses are returned immediately
pub async fn execute_request_with_retry(
    request_builder: RequestBuilder,
    method_name: &str,
    url_or_action: &str,
    max_retries: u32,
) -> Result<Response, CzdsError> {
    if max_retries == 0 {
        return execute_request(request_builder, method_name, url_or_action).await;
    }

    let mut last_error = None;

    for attempt in 0..=max_retries {
        // Clone the request (RequestBuilder can only be used once)
        let Some(req) = request_builder.try_clone() else {
            // Unable to clone (body stream), fallback to not retrying
            log::warn!("[czds] Cannot clone request, disabling retry");
            return execute_request(request_builder, method_name, url_or_action).await;
        };

        match execute_request(req, method_name, url_or_action).await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                let delay = backoff_delay(attempt);
                log::warn!(
                    "[czds] Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                    attempt + 1,
                    max_retries,
                    delay.as_secs_f32(),
                    e
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| CzdsError::NetworkError {
        detail: "All retries exhausted with no error captured".to_string(),
    }))
}

/// Read the response body as text, mapping transport failures.
pub async fn read_body(response: Response) -> Result<String, CzdsError> {
    response.text().await.map_err(|e| CzdsError::NetworkError {
        detail: format!("Failed to read response body: {e}"),
    })
}

/// Calculate exponential backoff delay.
///
/// Backoff strategy: 100ms, 200ms, 400ms, 800ms, 1.6s, ...
/// Maximum delay limit is 10 seconds
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    let delay_ms = delay_ms.min(10_000); // Maximum 10 seconds
    Duration::from_millis(delay_ms)
}
