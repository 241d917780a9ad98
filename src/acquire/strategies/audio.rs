// Audio transcription strategy - download the audio track and send it
// to a remote transcription endpoint
//
// Opt-in via configuration: it is slow, costs API credits, and needs
// the yt-dlp binary. The temporary download directory is owned by a
// TempDir guard, so it is removed on every exit path.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::AcquisitionStrategy;
use crate::acquire::config::AcquireConfig;
use crate::acquire::errors::AcquireError;
use crate::acquire::models::RetrievalTarget;
use crate::acquire::util::run_with_timeout;

const DEFAULT_WATCH_BASE: &str = "https://www.youtube.com";
const DEFAULT_API_BASE: &str = "https://api.openai.com";
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

pub struct AudioTranscriptionStrategy {
    client: Client,
    enabled: bool,
    max_bytes: Option<u64>,
    api_key: Option<String>,
    api_base: String,
    model: String,
    ytdlp_path: String,
    watch_base: String,
}

impl AudioTranscriptionStrategy {
    pub fn new(client: Client, config: &AcquireConfig) -> Self {
        Self {
            client,
            enabled: config.audio_transcription_enabled,
            max_bytes: config.audio_max_bytes,
            api_key: config.openai_api_key.clone(),
            api_base: config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.whisper_model.clone(),
            ytdlp_path: config
                .ytdlp_path
                .clone()
                .unwrap_or_else(|| find_ytdlp().to_string()),
            watch_base: DEFAULT_WATCH_BASE.to_string(),
        }
    }

    pub fn with_watch_base(mut self, base: impl Into<String>) -> Self {
        self.watch_base = base.into().trim_end_matches('/').to_string();
        self
    }

    async fn download_audio(&self, video_url: &str, dir: &Path) -> Result<PathBuf, AcquireError> {
        let template = dir.join("audio.%(ext)s");
        let mut args = vec![
            "-f".to_string(),
            "bestaudio[ext=m4a]/bestaudio".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "10".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
        ];
        if let Some(max_bytes) = self.max_bytes {
            args.push("--max-filesize".to_string());
            args.push(max_bytes.to_string());
        }
        args.push(video_url.to_string());

        let output = run_with_timeout(&self.ytdlp_path, &args, DOWNLOAD_TIMEOUT_SECS).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquireError::Execution(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let file = std::fs::read_dir(dir)
            .map_err(|e| AcquireError::Execution(format!("temp dir unreadable: {e}")))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| path.is_file())
            .ok_or_else(|| {
                AcquireError::Execution("audio download produced no output file".to_string())
            })?;

        if let Some(max_bytes) = self.max_bytes {
            let size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
            if size > max_bytes {
                return Err(AcquireError::Execution(format!(
                    "downloaded audio is {size} bytes, over the {max_bytes} byte limit"
                )));
            }
        }
        Ok(file)
    }

    async fn transcribe(&self, file: &Path) -> Result<String, AcquireError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AcquireError::Payload("audio transcription needs OPENAI_API_KEY".to_string())
        })?;

        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| AcquireError::Execution(format!("audio file unreadable: {e}")))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.m4a".to_string());

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let url = format!("{}/v1/audio/transcriptions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AcquireError::UpstreamStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let transcript = response.text().await?.trim().to_string();
        if transcript.is_empty() {
            return Err(AcquireError::Payload(
                "whisper transcription returned empty text".to_string(),
            ));
        }
        Ok(transcript)
    }
}

/// Locate the yt-dlp binary in the usual install locations, falling
/// back to PATH lookup at spawn time.
fn find_ytdlp() -> &'static str {
    const COMMON_PATHS: [&str; 3] = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];
    for path in COMMON_PATHS {
        if Path::new(path).exists() {
            return path;
        }
    }
    "yt-dlp"
}

#[async_trait]
impl AcquisitionStrategy for AudioTranscriptionStrategy {
    fn name(&self) -> &'static str {
        "audio"
    }

    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
        if !self.enabled {
            return Err(AcquireError::Disabled("audio"));
        }

        // Dropped on every exit path below, deleting the download.
        let temp_dir = tempfile::tempdir()
            .map_err(|e| AcquireError::Execution(format!("temp dir creation failed: {e}")))?;

        let video_url = format!("{}/watch?v={}", self.watch_base, target.identifier());
        debug!(%video_url, "audio strategy downloading");
        let file = self.download_audio(&video_url, temp_dir.path()).await?;

        let result = self.transcribe(&file).await;
        if let Err(e) = temp_dir.close() {
            warn!(error = %e, "temp dir cleanup failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::models::Platform;

    fn strategy(enabled: bool) -> AudioTranscriptionStrategy {
        let config = AcquireConfig {
            audio_transcription_enabled: enabled,
            ..AcquireConfig::default()
        };
        AudioTranscriptionStrategy::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_disabled_strategy_fails_fast() {
        let target = RetrievalTarget::new(Platform::Video, "dQw4w9WgXcQ", vec![]);
        let result = strategy(false).attempt(&target).await;
        assert!(matches!(result, Err(AcquireError::Disabled("audio"))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let strategy = strategy(true);
        let file = std::env::temp_dir().join("does-not-matter.m4a");
        let result = strategy.transcribe(&file).await;
        let reason = result.unwrap_err().to_string();
        assert!(reason.contains("OPENAI_API_KEY"));
    }
}
