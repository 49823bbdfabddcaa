//! HTTP retry helper for transient errors.
//!
//! Connection failures, timeouts, HTTP 429 and HTTP 5xx are retried with
//! exponential backoff. Any other response, including 4xx, is handed back
//! to the caller untouched so it can extract the API's error detail.

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts for transient failures.
///
/// With exponential backoff (1s, 2s, 4s) the total wait before giving up
/// is 7 seconds, which keeps a failed poll well inside the default poll
/// interval.
pub const MAX_RETRIES: u32 = 3;

/// Sends the request built by `build_request`, retrying transient
/// failures up to `max_retries` times.
///
/// The closure is called on every attempt because a
/// [`reqwest::RequestBuilder`] is consumed by `send()`.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the request could not be sent after
/// all retries. A response is returned even when its status is an error;
/// after retries are exhausted on 429/5xx the last response is returned.
#[allow(clippy::future_not_send)]
pub async fn send<F>(build_request: F, max_retries: u32) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("transient error: {e}");
                } else {
                    return Err(SourceError::Http(e));
                }
            }
            Ok(response) => {
                let status = response.status();
                let retryable =
                    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if !retryable || attempt >= max_retries {
                    return Ok(response);
                }
                log::warn!("HTTP {status} from {}", response.url());
            }
        }

        attempt += 1;
        let delay = backoff(attempt);
        log::warn!("retry {attempt}/{max_retries} in {delay:?}...");
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
const fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << (attempt.saturating_sub(1)))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
    }
}
