// Common data models for the acquisition pipeline

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::classify::{classify, Category};

/// Content platforms the pipeline can acquire text from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Video platform - spoken-word captions
    Video,
    /// Microblogging platform - post text
    Post,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Post => write!(f, "post"),
        }
    }
}

lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap();
}

impl Platform {
    /// Extract the platform-specific identifier from an already-validated
    /// source URL: the 11-character video token, or the post id from the
    /// URL path (`/user/status/<id>` and the `/i/web/status/<id>` form).
    pub fn extract_identifier(&self, url: &str) -> Option<String> {
        match self {
            Self::Video => VIDEO_ID_RE
                .captures(url)
                .map(|caps| caps[1].to_string()),
            Self::Post => extract_post_id(url),
        }
    }
}

fn extract_post_id(url: &str) -> Option<String> {
    let after_scheme = url.splitn(2, "//").last().unwrap_or(url);
    let path = after_scheme.splitn(2, '/').nth(1)?;
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 4 && segments[0] == "i" && segments[1] == "web" && segments[2] == "status"
    {
        return Some(segments[3].to_string());
    }
    if segments.len() >= 3 && segments[1] == "status" {
        return Some(segments[2].to_string());
    }
    if segments.len() >= 2 && segments[0] == "status" {
        return Some(segments[1].to_string());
    }
    None
}

/// A single acquisition request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RetrievalTarget {
    platform: Platform,
    identifier: String,
    preferred_languages: Vec<String>,
}

impl RetrievalTarget {
    pub fn new(
        platform: Platform,
        identifier: impl Into<String>,
        preferred_languages: Vec<String>,
    ) -> Self {
        Self {
            platform,
            identifier: identifier.into(),
            preferred_languages,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Ordered language preference, most preferred first. May be empty.
    pub fn preferred_languages(&self) -> &[String] {
        &self.preferred_languages
    }

    /// Deterministic cache key for this target.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.platform, self.identifier)
    }
}

/// A handle to one available caption stream; not yet downloaded content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub fetch_locator: String,
}

/// One normalized unit of extracted text. Never empty-string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
}

/// Successfully acquired text plus the strategy that produced it.
/// Consumers use `source_strategy` to set confidence labels.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedText {
    pub text: String,
    pub source_strategy: &'static str,
}

/// One failed strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Every strategy in the chain was tried and failed. Attempts are kept
/// in chain order.
#[derive(Debug, Clone)]
pub struct ChainFailure {
    pub attempts: Vec<StrategyFailure>,
}

impl ChainFailure {
    /// Coarse user-facing category derived from the accumulated reasons.
    pub fn category(&self) -> Category {
        classify(&self.attempts)
    }

    /// Diagnostic message for the caller. With `debug` set, includes
    /// per-strategy failure detail; otherwise only the coarse category.
    pub fn diagnostic(&self, debug: bool) -> String {
        let category = self.category();
        if !debug {
            return format!("content unavailable ({category})");
        }
        let detail: Vec<String> = self.attempts.iter().map(|a| a.to_string()).collect();
        format!("content unavailable ({category}): {}", detail.join("; "))
    }
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all strategies failed ({} attempted, {})",
            self.attempts.len(),
            self.category()
        )
    }
}

impl std::error::Error for ChainFailure {}
