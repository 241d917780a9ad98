// Failure classification - maps an exhausted chain to a diagnostic category
//
// Ordered keyword matching over the concatenated lowercase failure
// reasons; the first matching category wins. Purely diagnostic, never
// used for control flow.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models::StrategyFailure;

/// Coarse, user-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Upstream rejected automated access (rate limit, login wall)
    BotBlocked,
    /// The content has no caption track to fetch
    NoCaptionAvailable,
    /// Audio download step failed
    DownloadFailed,
    /// Audio transcription step failed
    TranscriptionFailed,
    /// Transport-level failure reaching upstream
    NetworkError,
    Unknown,
}

impl Category {
    pub fn description(&self) -> &'static str {
        match self {
            Self::BotBlocked => "upstream rejected automated access",
            Self::NoCaptionAvailable => "no caption track available for this content",
            Self::DownloadFailed => "audio download failed",
            Self::TranscriptionFailed => "audio transcription failed",
            Self::NetworkError => "network failure while contacting upstream",
            Self::Unknown => "unknown failure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BotBlocked => "bot-blocked",
            Self::NoCaptionAvailable => "no-caption",
            Self::DownloadFailed => "download-failed",
            Self::TranscriptionFailed => "transcription-failed",
            Self::NetworkError => "network-error",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Classify an accumulated failure set into one category.
pub fn classify(failures: &[StrategyFailure]) -> Category {
    let text = failures
        .iter()
        .map(|f| f.reason.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Category::Unknown;
    }

    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if matches_any(&["not a bot", "sign in", "429", "too many requests", "captcha"]) {
        return Category::BotBlocked;
    }
    if matches_any(&["caption", "subtitle", "transcript"]) {
        return Category::NoCaptionAvailable;
    }
    if matches_any(&["yt-dlp", "download", "audio"]) {
        return Category::DownloadFailed;
    }
    if matches_any(&["whisper", "openai"]) {
        return Category::TranscriptionFailed;
    }
    if matches_any(&["timeout", "timed out", "connect"]) {
        return Category::NetworkError;
    }
    Category::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(reason: &str) -> StrategyFailure {
        StrategyFailure {
            strategy: "test",
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_429_is_bot_blocked() {
        let failures = vec![failure("https://example.com/watch -> status 429")];
        assert_eq!(classify(&failures), Category::BotBlocked);
    }

    #[test]
    fn test_sign_in_wall_is_bot_blocked() {
        let failures = vec![failure("Sign in to confirm you're not a bot")];
        assert_eq!(classify(&failures), Category::BotBlocked);
    }

    #[test]
    fn test_missing_captions() {
        let failures = vec![failure("empty caption tracks")];
        assert_eq!(classify(&failures), Category::NoCaptionAvailable);
    }

    #[test]
    fn test_download_failure() {
        let failures = vec![failure("yt-dlp exited with code 1")];
        assert_eq!(classify(&failures), Category::DownloadFailed);
    }

    #[test]
    fn test_transcription_failure() {
        let failures = vec![failure("whisper returned empty text")];
        assert_eq!(classify(&failures), Category::TranscriptionFailed);
    }

    #[test]
    fn test_network_failure() {
        let failures = vec![failure("error trying to connect: dns failure")];
        assert_eq!(classify(&failures), Category::NetworkError);
        let failures = vec![failure("timed out after 10s")];
        assert_eq!(classify(&failures), Category::NetworkError);
    }

    #[test]
    fn test_empty_and_unmatched_are_unknown() {
        assert_eq!(classify(&[]), Category::Unknown);
        let failures = vec![failure("something odd happened")];
        assert_eq!(classify(&failures), Category::Unknown);
    }

    #[test]
    fn test_first_matching_category_wins() {
        // Bot signals outrank caption signals regardless of order.
        let failures = vec![
            failure("empty caption tracks"),
            failure("status 429 from upstream"),
        ];
        assert_eq!(classify(&failures), Category::BotBlocked);
    }
}
