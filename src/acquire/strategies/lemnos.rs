// Lemnos strategy - caption tracks via a third-party mirror API
//
// Fast because it skips the full watch page, but depends on mirror
// availability. Ordered right after the player strategy.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ensure_vtt_format, AcquisitionStrategy};
use crate::acquire::captions::{fragments_to_text, parse_payload};
use crate::acquire::errors::AcquireError;
use crate::acquire::language::select_track;
use crate::acquire::models::{CaptionTrack, RetrievalTarget};

const DEFAULT_BASE_URL: &str = "https://yt.lemnoslife.com";

pub struct LemnosStrategy {
    client: Client,
    base_url: String,
}

impl LemnosStrategy {
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

fn mirror_tracks(data: &Value) -> Vec<CaptionTrack> {
    data["items"]
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item["captionTracks"].as_array())
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|track| {
                    let locator = track["baseUrl"].as_str()?;
                    Some(CaptionTrack {
                        language_code: track["languageCode"].as_str().unwrap_or("").to_string(),
                        fetch_locator: locator.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl AcquisitionStrategy for LemnosStrategy {
    fn name(&self) -> &'static str {
        "lemnos"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let meta_url = format!(
            "{}/videos?part=captionTracks&id={}",
            self.base_url,
            target.identifier()
        );
        let response = self.client.get(&meta_url).send().await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: meta_url,
                status: response.status().as_u16(),
            });
        }
        let data: Value = response.json().await?;

        let tracks = mirror_tracks(&data);
        if tracks.is_empty() {
            return Err(AcquireError::NoCaptionTracks);
        }
        let track = select_track(target.preferred_languages(), &tracks);
        debug!(language = %track.language_code, "lemnos strategy selected track");

        let caption_url = ensure_vtt_format(&track.fetch_locator);
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
    fn test_mirror_tracks_extraction() {
        let data: Value = serde_json::json!({
            "items": [{
                "captionTracks": [
                    {"baseUrl": "https://e.com/a", "languageCode": "en"},
                    {"baseUrl": "https://e.com/b", "languageCode": "zh-Hans"}
                ]
            }]
        });
        let tracks = mirror_tracks(&data);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].language_code, "zh-Hans");
    }

    #[test]
    fn test_mirror_tracks_empty_items() {
        let data: Value = serde_json::json!({"items": []});
        assert!(mirror_tracks(&data).is_empty());
    }
}
