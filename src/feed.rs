//! Downloading source feeds.

use anyhow::{Context, Result};
use tracing::debug;

/// Somewhere feed documents come from.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFeeds {
    client: reqwest::Client,
}

impl HttpFeeds {
    pub fn new(client: reqwest::Client) -> Self {
        HttpFeeds { client }
    }
}

impl FeedSource for HttpFeeds {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = normalize_url(url);
        debug!(%url, "downloading feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Feed server rejected {url}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))
    }
}

/// webcal:// is plain HTTPS with a calendar-app hint.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    match trimmed.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &trimmed[9..])
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webcal_becomes_https() {
        assert_eq!(
            normalize_url("webcal://example.com/a.ics"),
            "https://example.com/a.ics"
        );
        assert_eq!(
            normalize_url("WEBCAL://example.com/a.ics"),
            "https://example.com/a.ics"
        );
        assert_eq!(
            normalize_url(" https://example.com/a.ics "),
            "https://example.com/a.ics"
        );
    }
}
