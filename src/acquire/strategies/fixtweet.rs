// FixTweet strategy - post text via a free mirror API
//
// The most reliable post source that needs no credentials; ordered
// first in the post chain.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::AcquisitionStrategy;
use crate::acquire::errors::AcquireError;
use crate::acquire::models::RetrievalTarget;
use crate::acquire::util::browser_headers;

const DEFAULT_BASE_URL: &str = "https://api.fxtwitter.com";

pub struct FixTweetStrategy {
    client: Client,
    base_url: String,
}

impl FixTweetStrategy {
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

/// Author attribution line, e.g. `Jane Doe @jane`.
pub(crate) fn author_line(name: &str, screen_name: &str) -> String {
    let screen = if screen_name.is_empty() {
        String::new()
    } else {
        format!("@{screen_name}")
    };
    format!("{name} {screen}").trim().to_string()
}

#[async_trait]
impl AcquisitionStrategy for FixTweetStrategy {
    fn name(&self) -> &'static str {
        "fixtweet"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let url = format!("{}/status/{}", self.base_url, target.identifier());
        let response = self
            .client
            .get(&url)
            .headers(browser_headers())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let data: Value = response.json().await?;
        if data["code"].as_i64() != Some(200) {
            return Err(AcquireError::Payload(format!(
                "{url} -> unexpected code {}",
                data["code"]
            )));
        }
        let tweet = &data["tweet"];
        let text = tweet["text"].as_str().unwrap_or("").trim();
        if text.is_empty() {
            return Err(AcquireError::Payload(format!("{url} -> empty post text")));
        }

        let author = &tweet["author"];
        let title = author_line(
            author["name"].as_str().unwrap_or("User"),
            author["screen_name"].as_str().unwrap_or(""),
        );
        Ok(format!("{title}\n{text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_line() {
        assert_eq!(author_line("Jane Doe", "jane"), "Jane Doe @jane");
        assert_eq!(author_line("Jane Doe", ""), "Jane Doe");
    }
}
