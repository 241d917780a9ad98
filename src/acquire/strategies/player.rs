// Player strategy - captions from the player metadata embedded in the
// watch page
//
// Fastest and most reliable source: one page fetch plus one caption
// fetch, no third-party mirror involved. Ordered first in the chain.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ensure_vtt_format, AcquisitionStrategy};
use crate::acquire::captions::{fragments_to_text, parse_payload};
use crate::acquire::errors::AcquireError;
use crate::acquire::language::select_track;
use crate::acquire::models::{CaptionTrack, RetrievalTarget};
use crate::acquire::util::{browser_headers, extract_json_object, CONSENT_COOKIE};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

pub struct PlayerStrategy {
    client: Client,
    base_url: String,
}

impl PlayerStrategy {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the strategy at a different host (tests, regional mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_watch_page(&self, watch_url: &str) -> Result<String, AcquireError> {
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
        Ok(response.text().await?)
    }
}

/// Pull the caption track list out of a parsed player response.
fn caption_tracks(data: &Value) -> Vec<CaptionTrack> {
    data["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|track| {
                    let locator = track["baseUrl"].as_str().or_else(|| track["url"].as_str())?;
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
impl AcquisitionStrategy for PlayerStrategy {
    fn name(&self) -> &'static str {
        "player"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let watch_url = format!("{}/watch?v={}", self.base_url, target.identifier());
        let body = self.fetch_watch_page(&watch_url).await?;

        let payload = extract_json_object(&body, PLAYER_RESPONSE_MARKER).ok_or_else(|| {
            AcquireError::Payload(format!("{watch_url} -> {PLAYER_RESPONSE_MARKER} not found"))
        })?;
        let data: Value = serde_json::from_str(&payload)
            .map_err(|e| AcquireError::Payload(format!("{watch_url} -> player json parse failed: {e}")))?;

        let tracks = caption_tracks(&data);
        if tracks.is_empty() {
            return Err(AcquireError::NoCaptionTracks);
        }
        let track = select_track(target.preferred_languages(), &tracks);
        debug!(language = %track.language_code, "player strategy selected track");

        let caption_url = ensure_vtt_format(&track.fetch_locator);
        let response = self
            .client
            .get(&caption_url)
            .headers(browser_headers())
            .send()
            .await?;
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
