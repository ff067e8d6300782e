//! Target-page metadata and prefetch client.
//!
//! Title lookups feed the `/to` interstitial; they are best-effort, bounded
//! by a timeout, and collapsed through the request deduper so near-
//! simultaneous visits to the same target fetch once. Prefetch is a pure
//! warm-up: fire-and-forget, failures ignored.

use std::time::Duration;
use tracing::debug;

use crate::infrastructure::cache::RequestDeduper;

/// Outbound client for target URLs.
pub struct MetadataService {
    http: reqwest::Client,
    titles: RequestDeduper<Option<String>>,
}

impl MetadataService {
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration, dedup_ttl: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            titles: RequestDeduper::new(dedup_ttl),
        })
    }

    /// Fetches the target page's `<title>`. Any failure yields `None`.
    pub async fn title(&self, url: &str) -> Option<String> {
        let key = format!("title:{url}");
        let http = self.http.clone();
        let url = url.to_string();

        self.titles
            .get(&key, || async move {
                let body = http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| debug!("title fetch failed: {e}"))?
                    .text()
                    .await
                    .map_err(|e| debug!("title body unreadable: {e}"))?;
                Ok::<_, ()>(extract_title(&body))
            })
            .await
            .unwrap_or(None)
    }

    /// Fire-and-forget warm-up of the target URL.
    pub fn prefetch(&self, url: &str) {
        let http = self.http.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let _ = http.get(&url).send().await;
        });
    }

    /// Removes expired title slots. Called by the periodic sweep.
    pub fn evict_expired(&self) -> usize {
        self.titles.evict_expired()
    }
}

/// Pulls the text of the first `<title>` element, if any.
fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = lower[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title")? + open_end;

    let title = html[open_end..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
