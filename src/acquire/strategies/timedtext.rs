// Timedtext strategy - the legacy caption API
//
// Two passes per base endpoint: ask for the track listing and fetch the
// selected track, then fall back to probing likely (language, kind)
// combinations directly when the listing itself is empty or blocked.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::debug;

use super::AcquisitionStrategy;
use crate::acquire::captions::{fragments_to_text, parse_payload};
use crate::acquire::errors::AcquireError;
use crate::acquire::language::select_by_code;
use crate::acquire::models::RetrievalTarget;
use crate::acquire::util::browser_headers;

const DEFAULT_BASES: [&str; 2] = [
    "https://video.google.com/timedtext",
    "https://www.youtube.com/api/timedtext",
];

/// Track kinds probed when the listing is unavailable. The empty kind
/// is a manually-authored track, `asr` the auto-generated one.
const PROBE_KINDS: [&str; 2] = ["", "asr"];

#[derive(Debug, Clone)]
struct ListedTrack {
    lang_code: String,
    name: Option<String>,
    kind: Option<String>,
}

pub struct TimedTextStrategy {
    client: Client,
    bases: Vec<String>,
}

impl TimedTextStrategy {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            bases: DEFAULT_BASES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    async fn fetch_caption(
        &self,
        base: &str,
        video_id: &str,
        lang: &str,
        name: Option<&str>,
        kind: Option<&str>,
    ) -> Result<String, AcquireError> {
        let mut params = vec![("lang", lang), ("v", video_id), ("fmt", "vtt")];
        if let Some(name) = name {
            params.push(("name", name));
        }
        if let Some(kind) = kind.filter(|k| !k.is_empty()) {
            params.push(("kind", kind));
        }
        let response = self
            .client
            .get(base)
            .headers(browser_headers())
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: format!("{base}?lang={lang}&v={video_id}"),
                status: response.status().as_u16(),
            });
        }
        let text = fragments_to_text(&parse_payload(&response.text().await?));
        if text.is_empty() {
            return Err(AcquireError::EmptyTranscript);
        }
        Ok(text)
    }

    /// Listing pass against one base.
    async fn try_listing(
        &self,
        base: &str,
        target: &RetrievalTarget,
    ) -> Result<String, AcquireError> {
        let list_url = format!("{base}?type=list&v={}", target.identifier());
        let response = self
            .client
            .get(base)
            .headers(browser_headers())
            .query(&[("type", "list"), ("v", target.identifier())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url: list_url,
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(AcquireError::Payload(format!("{list_url} -> empty response")));
        }

        let tracks = parse_track_list(&body)?;
        if tracks.is_empty() {
            return Err(AcquireError::Payload(format!("{list_url} -> empty tracks")));
        }

        let track = select_by_code(target.preferred_languages(), &tracks, |t| {
            t.lang_code.as_str()
        });
        debug!(language = %track.lang_code, "timedtext strategy selected track");
        self.fetch_caption(
            base,
            target.identifier(),
            &track.lang_code,
            track.name.as_deref(),
            track.kind.as_deref(),
        )
        .await
    }
}

/// Parse the `<transcript_list><track .../></transcript_list>` listing.
fn parse_track_list(xml: &str) -> Result<Vec<ListedTrack>, AcquireError> {
    let mut reader = Reader::from_str(xml);
    let mut tracks = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"track" => {
                let attr = |name: &str| -> Option<String> {
                    e.try_get_attribute(name)
                        .ok()
                        .flatten()
                        .and_then(|a| a.unescape_value().ok())
                        .map(|v| v.into_owned())
                        .filter(|v| !v.is_empty())
                };
                if let Some(lang_code) = attr("lang_code") {
                    tracks.push(ListedTrack {
                        lang_code,
                        name: attr("name"),
                        kind: attr("kind"),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(AcquireError::Payload(format!(
                    "track list parse failed: {e}"
                )));
            }
        }
    }
    Ok(tracks)
}

#[async_trait]
impl AcquisitionStrategy for TimedTextStrategy {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        let mut errors: Vec<String> = Vec::new();

        for base in &self.bases {
            match self.try_listing(base, target).await {
                Ok(text) => return Ok(text),
                Err(e) => errors.push(e.to_string()),
            }
        }

        // Listing blocked or empty everywhere; probe likely tracks
        // directly.
        for base in &self.bases {
            for lang in target.preferred_languages() {
                for kind in PROBE_KINDS {
                    match self
                        .fetch_caption(base, target.identifier(), lang, None, Some(kind))
                        .await
                    {
                        Ok(text) => return Ok(text),
                        Err(e) => errors.push(format!("{base}?lang={lang}&kind={kind} -> {e}")),
                    }
                }
            }
        }

        Err(AcquireError::Payload(format!(
            "timedtext exhausted: {}",
            errors.join("; ")
        )))
    }
}
