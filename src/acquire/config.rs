// Configuration for the acquisition pipeline

use std::env;

/// Runtime configuration, loaded once at startup. All knobs have
/// defaults so `AcquireConfig::default()` is a working configuration.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Ordered language preference used when a target carries none
    pub preferred_languages: Vec<String>,
    /// Cache entry lifetime in seconds; 0 disables caching entirely
    pub cache_ttl_secs: u64,
    /// Maximum number of cached entries
    pub cache_max_items: usize,
    /// Enables the audio-download-and-transcribe strategy
    pub audio_transcription_enabled: bool,
    /// Optional cap on downloaded audio size in bytes
    pub audio_max_bytes: Option<u64>,
    /// Include per-strategy failure detail in diagnostics
    pub debug: bool,
    /// Alternate public instances for the piped strategy
    pub piped_instances: Vec<String>,
    /// Per-call HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Optional SOCKS5/HTTP proxy URL for all outbound calls
    pub proxy: Option<String>,
    /// API key for the transcription endpoint
    pub openai_api_key: Option<String>,
    /// Override for the transcription endpoint base URL
    pub openai_base_url: Option<String>,
    /// Transcription model name
    pub whisper_model: String,
    /// Override for the yt-dlp binary path
    pub ytdlp_path: Option<String>,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            preferred_languages: default_languages(),
            cache_ttl_secs: 3600,
            cache_max_items: 256,
            audio_transcription_enabled: false,
            audio_max_bytes: None,
            debug: false,
            piped_instances: default_piped_instances(),
            request_timeout_secs: 10,
            proxy: None,
            openai_api_key: None,
            openai_base_url: None,
            whisper_model: "whisper-1".to_string(),
            ytdlp_path: None,
        }
    }
}

impl AcquireConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            preferred_languages: env::var("TRANSCRIPT_LANGS")
                .ok()
                .map(|v| split_csv(&v))
                .filter(|langs| !langs.is_empty())
                .unwrap_or_else(default_languages),
            cache_ttl_secs: env_parse("CACHE_TTL_SECONDS", 3600),
            cache_max_items: env_parse("CACHE_MAX_ITEMS", 256),
            audio_transcription_enabled: env_flag("ENABLE_AUDIO_TRANSCRIPT"),
            audio_max_bytes: env::var("AUDIO_MAX_MB")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|mb| mb * 1024 * 1024),
            debug: env_flag("TRANSCRIPT_DEBUG"),
            piped_instances: env::var("PIPED_INSTANCES")
                .ok()
                .map(|v| {
                    split_csv(&v)
                        .into_iter()
                        .map(|item| item.trim_end_matches('/').to_string())
                        .collect()
                })
                .filter(|list: &Vec<String>| !list.is_empty())
                .unwrap_or_else(default_piped_instances),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECONDS", 10),
            proxy: env::var("TEXTSOURCE_PROXY").ok().filter(|v| !v.is_empty()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            whisper_model: env::var("WHISPER_MODEL").unwrap_or_else(|_| "whisper-1".to_string()),
            ytdlp_path: env::var("YTDLP_PATH").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn default_languages() -> Vec<String> {
    ["zh-Hans", "zh-CN", "zh", "zh-TW", "en", "en-US", "en-GB"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_piped_instances() -> Vec<String> {
    [
        "https://piped.video",
        "https://piped.mha.fi",
        "https://piped.lunar.icu",
        "https://vid.puffyan.us",
        "https://piped-api.kavin.rocks",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
