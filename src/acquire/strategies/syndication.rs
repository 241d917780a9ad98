// Syndication strategy - post text via the embed CDN
//
// Historically flaky, kept as the post-chain fallback behind the
// mirror API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::fixtweet::author_line;
use super::AcquisitionStrategy;
use crate::acquire::errors::AcquireError;
use crate::acquire::models::RetrievalTarget;
use crate::acquire::util::browser_headers;

const DEFAULT_BASE_URL: &str = "https://cdn.syndication.twimg.com";

pub struct SyndicationStrategy {
    client: Client,
    base_url: String,
}

impl SyndicationStrategy {
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
}

#[async_trait]
impl AcquisitionStrategy for SyndicationStrategy {
    fn name(&self) -> &'static str {
        "syndication"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let lang = target
            .preferred_languages()
            .first()
            .map(String::as_str)
            .unwrap_or("en");
        let url = format!("{}/tweet-result", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(browser_headers())
            .query(&[("id", target.identifier()), ("lang", lang)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let data: Value = response.json().await?;
        let text = data["text"]
            .as_str()
            .or_else(|| data["full_text"].as_str())
            .or_else(|| data["raw_text"].as_str())
            .unwrap_or("")
            .trim();
        if text.is_empty() {
            return Err(AcquireError::Payload(format!("{url} -> empty post text")));
        }

        let user = &data["user"];
        let title = author_line(
            user["name"].as_str().unwrap_or("User"),
            user["screen_name"].as_str().unwrap_or(""),
        );
        Ok(format!("{title}\n{text}"))
    }
}
