//! Where rendered listing pages come from.
//!
//! Rendering and challenge handling happen outside this crate. A
//! [`PageSource`] just hands back the markup for one zip: either a file saved
//! by an external renderer ([`DirectoryPageSource`]) or a plain HTTP fetch
//! ([`HttpPageSource`]) for sites that serve listings without scripting.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Placeholder replaced by the zip in a page URL template.
pub const ZIP_PLACEHOLDER: &str = "{zip}";

pub trait PageSource {
    /// Raw markup of the listing page for `zip`.
    fn fetch_page(&self, zip: &str) -> impl Future<Output = Result<String, ScraperError>> + Send;
}

/// Reads `<dir>/<zip>.html`.
#[derive(Debug, Clone)]
pub struct DirectoryPageSource {
    dir: PathBuf,
}

impl DirectoryPageSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn page_path(&self, zip: &str) -> PathBuf {
        self.dir.join(format!("{zip}.html"))
    }
}

impl PageSource for DirectoryPageSource {
    async fn fetch_page(&self, zip: &str) -> Result<String, ScraperError> {
        let path = self.page_path(zip);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ScraperError::PageIo { path, source })
    }
}

/// Fetches `url_template` with `{zip}` substituted.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    url_template: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HttpPageSource {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrlTemplate`] if the template lacks
    /// `{zip}` or does not form a valid URL, and [`ScraperError::Http`] if the
    /// HTTP client cannot be built.
    pub fn new(
        url_template: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        if !url_template.contains(ZIP_PLACEHOLDER) {
            return Err(ScraperError::InvalidUrlTemplate {
                template: url_template.to_owned(),
                reason: format!("missing {ZIP_PLACEHOLDER} placeholder"),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let source = Self {
            client,
            url_template: url_template.to_owned(),
            max_retries,
            backoff_base_secs,
        };
        source.page_url("00000")?;
        Ok(source)
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrlTemplate`] if the substituted
    /// template does not parse as a URL.
    pub fn page_url(&self, zip: &str) -> Result<Url, ScraperError> {
        let raw = self.url_template.replace(ZIP_PLACEHOLDER, zip);
        Url::parse(&raw).map_err(|e| ScraperError::InvalidUrlTemplate {
            template: self.url_template.clone(),
            reason: e.to_string(),
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: url.host_str().unwrap_or_default().to_owned(),
                retry_after_secs,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_string(),
            });
        }
        // Challenge pages arrive as 200, 403 or 503; only those bodies are worth reading.
        let may_be_challenge = status.is_success()
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::SERVICE_UNAVAILABLE;
        if !may_be_challenge {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if looks_like_bot_challenge(&body) {
            return Err(ScraperError::BotChallenge {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, zip: &str) -> Result<String, ScraperError> {
        let url = self.page_url(zip)?;
        tracing::debug!(zip, url = %url, "fetching listing page");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(&url)
        })
        .await
    }
}

fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");

    has_cloudflare_banner
        || has_challenge_platform
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = HttpPageSource::new("https://prices.test/home", 30, "ua", 0, 0).unwrap_err();
        assert!(matches!(err, ScraperError::InvalidUrlTemplate { .. }));
    }

    #[test]
    fn template_that_is_not_a_url_is_rejected() {
        let err = HttpPageSource::new("prices/{zip}", 30, "ua", 0, 0).unwrap_err();
        assert!(matches!(err, ScraperError::InvalidUrlTemplate { .. }));
    }

    #[test]
    fn page_url_substitutes_zip() {
        let source =
            HttpPageSource::new("https://prices.test/home?search={zip}&fuel=1", 30, "ua", 0, 0)
                .unwrap();
        assert_eq!(
            source.page_url("01103").unwrap().as_str(),
            "https://prices.test/home?search=01103&fuel=1"
        );
    }

    #[test]
    fn directory_source_path_layout() {
        let source = DirectoryPageSource::new("/tmp/pages");
        assert_eq!(source.page_path("21044"), PathBuf::from("/tmp/pages/21044.html"));
    }

    #[test]
    fn detects_cloudflare_interstitials() {
        assert!(looks_like_bot_challenge(
            "<title>Just a moment...</title><div id=\"cf-chl-widget\"></div>"
        ));
        assert!(looks_like_bot_challenge(
            "<script src=\"/cdn-cgi/challenge-platform/h/b/orchestrate\"></script>"
        ));
        assert!(looks_like_bot_challenge(
            "<title>Attention Required! | Cloudflare</title>"
        ));
    }

    #[test]
    fn ordinary_listing_page_is_not_a_challenge() {
        assert!(!looks_like_bot_challenge(
            "<div><h3>Shell</h3><span>$3.49</span><p>Just a moment... loading</p></div>"
        ));
    }
}
