// Piped strategy - captions via alternate public instances
//
// Instances come and go, so the configured list is walked in order and
// every failure is remembered for diagnostics. Slowest of the caption
// strategies and ordered accordingly.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::AcquisitionStrategy;
use crate::acquire::captions::{fragments_to_text, parse_payload};
use crate::acquire::errors::AcquireError;
use crate::acquire::models::RetrievalTarget;

pub struct PipedStrategy {
    client: Client,
    instances: Vec<String>,
}

impl PipedStrategy {
    pub fn new(client: Client, instances: Vec<String>) -> Self {
        Self { client, instances }
    }
}

/// Instances differ in payload shape: either `{"captions": [...]}` or a
/// bare array.
fn caption_list(payload: &Value) -> Vec<&Value> {
    let captions = match payload {
        Value::Object(map) => map.get("captions").and_then(Value::as_array),
        Value::Array(list) => Some(list),
        _ => None,
    };
    captions.map(|list| list.iter().collect()).unwrap_or_default()
}

/// Instances also disagree on the code field name; match exact code or
/// label prefix per preference order, falling back to the first track.
fn pick_track<'a>(preferred: &[String], captions: &[&'a Value]) -> &'a Value {
    for lang in preferred {
        let lang = lang.to_lowercase();
        for track in captions {
            let code = track["languageCode"]
                .as_str()
                .or_else(|| track["language"].as_str())
                .or_else(|| track["code"].as_str())
                .unwrap_or("");
            let label = track["label"].as_str().unwrap_or("").to_lowercase();
            if code.to_lowercase() == lang || label.starts_with(&lang) {
                return track;
            }
        }
    }
    captions[0]
}

#[async_trait]
impl AcquisitionStrategy for PipedStrategy {
    fn name(&self) -> &'static str {
        "piped"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let mut errors: Vec<String> = Vec::new();

        for base in &self.instances {
            match self.try_instance(base, target).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    debug!(instance = %base, error = %e, "piped instance failed");
                    errors.push(format!("{base} -> {e}"));
                }
            }
        }

        if errors.is_empty() {
            return Err(AcquireError::Payload(
                "no piped instances configured".to_string(),
            ));
        }
        Err(AcquireError::Payload(format!(
            "piped exhausted: {}",
            errors.join("; ")
        )))
    }
}

impl PipedStrategy {
    async fn try_instance(
        &self,
        base: &str,
        target: &RetrievalTarget,
    ) -> Result<String, AcquireError> {
        let meta_url = format!("{base}/api/v1/captions/{}", target.identifier());
        let response = self.client.get(&meta_url).send().await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: meta_url,
                status: response.status().as_u16(),
            });
        }
        let payload: Value = response.json().await?;

        let captions = caption_list(&payload);
        if captions.is_empty() {
            return Err(AcquireError::NoCaptionTracks);
        }

        let track = pick_track(target.preferred_languages(), &captions);
        let caption_url = track["url"]
            .as_str()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AcquireError::Payload(format!("{meta_url} -> missing url")))?;
        let caption_url = if caption_url.starts_with('/') {
            format!("{base}{caption_url}")
        } else {
            caption_url.to_string()
        };

        let response = self.client.get(&caption_url).send().await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: caption_url,
                status: response.status().as_u16(),
            });
        }

        let text = fragments_to_text(&parse_payload(&response.text().await?));
        if text.is_empty() {
            return Err(AcquireError::EmptyTranscript);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_list_both_shapes() {
        let wrapped: Value = serde_json::json!({"captions": [{"url": "/a"}]});
        assert_eq!(caption_list(&wrapped).len(), 1);

        let bare: Value = serde_json::json!([{"url": "/a"}, {"url": "/b"}]);
        assert_eq!(caption_list(&bare).len(), 2);

        let odd: Value = serde_json::json!("nope");
        assert!(caption_list(&odd).is_empty());
    }

    #[test]
    fn test_pick_track_exact_code_and_label_prefix() {
        let payload: Value = serde_json::json!([
            {"code": "en", "label": "English", "url": "/en"},
            {"language": "zh-CN", "label": "Chinese (Simplified)", "url": "/zh"}
        ]);
        let captions = caption_list(&payload);

        // Exact code match.
        let track = pick_track(&["en".to_string()], &captions);
        assert_eq!(track["url"], "/en");

        // Label prefix match when the code differs.
        let track = pick_track(&["chinese".to_string()], &captions);
        assert_eq!(track["url"], "/zh");

        // No match falls back to first.
        let track = pick_track(&["ja".to_string()], &captions);
        assert_eq!(track["url"], "/en");
    }
}
