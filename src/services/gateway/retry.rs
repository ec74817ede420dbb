//! Rate-limit retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::warn;

use super::{GatewayError, Provider};

/// Upper bound on any single wait.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Parse a numeric `Retry-After` header value.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    header_value?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_DELAY))
}

/// Exponential backoff: `base_ms * 2^attempt`, capped at one minute.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_DELAY)
}

/// Retry a request while the provider answers 429.
///
/// Returns the first non-429 response. Once `max_retries` retries have been
/// spent, returns [`GatewayError::RateLimited`].
pub async fn retry_on_rate_limit<F, Fut>(
    provider: Provider,
    max_retries: u32,
    base_ms: u64,
    make_request: F,
) -> Result<Response, GatewayError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, GatewayError>>,
{
    let mut attempt = 0;
    loop {
        let response = make_request().await?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        let retry_after_secs = retry_after.and_then(|s| s.trim().parse::<u64>().ok());

        if attempt >= max_retries {
            return Err(GatewayError::RateLimited {
                provider,
                retry_after_secs,
            });
        }

        let wait = parse_retry_after(retry_after).unwrap_or_else(|| backoff_delay(attempt, base_ms));

        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            provider,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
