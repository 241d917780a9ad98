// Metadata strategy - title and description as a last resort
//
// Lowest fidelity but highest availability: the oEmbed endpoint and
// watch-page video details survive most caption outages. Always ordered
// last in the chain; succeeds whenever either title or description is
// non-empty.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::AcquisitionStrategy;
use crate::acquire::errors::AcquireError;
use crate::acquire::models::RetrievalTarget;
use crate::acquire::util::{browser_headers, extract_json_object, CONSENT_COOKIE};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Default)]
struct VideoMetadata {
    title: String,
    description: String,
    author: String,
}

impl VideoMetadata {
    fn is_usable(&self) -> bool {
        !self.title.is_empty() || !self.description.is_empty()
    }

    fn to_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            parts.push(format!("Title: {}", self.title));
        }
        if !self.description.is_empty() {
            parts.push(format!("Description: {}", self.description));
        }
        if !self.author.is_empty() {
            parts.push(format!("Author: {}", self.author));
        }
        parts.join("\n")
    }
}

pub struct MetadataStrategy {
    client: Client,
    base_url: String,
}

impl MetadataStrategy {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_oembed(
        &self,
        watch_url: &str,
        meta: &mut VideoMetadata,
    ) -> Result<(), AcquireError> {
        let oembed_url = format!("{}/oembed", self.base_url);
        let response = self
            .client
            .get(&oembed_url)
            .headers(browser_headers())
            .query(&[("url", watch_url), ("format", "json")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: oembed_url,
                status: response.status().as_u16(),
            });
        }
        let data: Value = response.json().await?;
        if let Some(title) = data["title"].as_str() {
            meta.title = title.trim().to_string();
        }
        if let Some(author) = data["author_name"].as_str() {
            meta.author = author.trim().to_string();
        }
        Ok(())
    }

    async fn fetch_video_details(
        &self,
        watch_url: &str,
        meta: &mut VideoMetadata,
    ) -> Result<(), AcquireError> {
        let response = self
            .client
            .get(watch_url)
            .headers(browser_headers())
            .header(COOKIE, CONSENT_COOKIE)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: watch_url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        let payload = extract_json_object(&body, "ytInitialPlayerResponse").ok_or_else(|| {
            AcquireError::Payload(format!("{watch_url} -> ytInitialPlayerResponse not found"))
        })?;
        let data: Value = serde_json::from_str(&payload)
            .map_err(|e| AcquireError::Payload(format!("{watch_url} -> player json parse failed: {e}")))?;

        let details = &data["videoDetails"];
        if meta.title.is_empty() {
            meta.title = details["title"].as_str().unwrap_or("").trim().to_string();
        }
        meta.description = details["shortDescription"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();
        if meta.author.is_empty() {
            meta.author = details["author"].as_str().unwrap_or("").trim().to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl AcquisitionStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let watch_url = format!("{}/watch?v={}", self.base_url, target.identifier());
        let mut meta = VideoMetadata::default();
        let mut errors: Vec<String> = Vec::new();

        if let Err(e) = self.fetch_oembed(&watch_url, &mut meta).await {
            debug!(error = %e, "oembed lookup failed");
            errors.push(e.to_string());
        }

        // The oEmbed endpoint never carries a description, so the watch
        // page is consulted whenever anything is still missing.
        if meta.title.is_empty() || meta.description.is_empty() {
            if let Err(e) = self.fetch_video_details(&watch_url, &mut meta).await {
                debug!(error = %e, "video details lookup failed");
                errors.push(e.to_string());
            }
        }

        if !meta.is_usable() {
            return Err(AcquireError::Payload(format!(
                "metadata unavailable: {}",
                errors.join("; ")
            )));
        }
        Ok(meta.to_text())
    }
}
