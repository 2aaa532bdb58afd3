//! Backoff for listing-page fetches.
//!
//! A zip page is fetched again only after 429s, transport failures, or a
//! challenge interstitial; those tend to clear within seconds. A 404 or an
//! unexpected status is final for that zip.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

fn worth_refetching(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_) | ScraperError::BotChallenge { .. }
    )
}

/// Pause before re-fetch number `attempt + 1`: `base * 2^attempt` seconds,
/// saturating instead of overflowing.
fn backoff_delay(backoff_base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(backoff_base_secs.saturating_mul(1u64 << attempt.min(62)))
}

/// Runs `fetch` until it succeeds, fails for good, or `max_retries`
/// re-fetches have been spent. The default config (base 2 s, two retries)
/// waits 2 s then 4 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut fetch: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match fetch().await {
            Ok(page) => return Ok(page),
            Err(err) if attempt < max_retries && worth_refetching(&err) => {
                let delay = backoff_delay(backoff_base_secs, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "page fetch failed, backing off before re-fetch"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
