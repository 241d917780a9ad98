// Acquisition strategies - one concrete method each for obtaining text
//
// Ordered fastest/most-reliable first, slowest/most-speculative last,
// so the common case resolves in one hop. Latency-sensitive callers
// truncate the chain instead of tuning individual strategies.

use async_trait::async_trait;
use reqwest::Client;

use super::config::AcquireConfig;
use super::errors::AcquireError;
use super::models::RetrievalTarget;

pub mod audio;
pub mod fixtweet;
pub mod lemnos;
pub mod metadata;
pub mod piped;
pub mod player;
pub mod syndication;
pub mod timedtext;

pub use audio::AudioTranscriptionStrategy;
pub use fixtweet::FixTweetStrategy;
pub use lemnos::LemnosStrategy;
pub use metadata::MetadataStrategy;
pub use piped::PipedStrategy;
pub use player::PlayerStrategy;
pub use syndication::SyndicationStrategy;
pub use timedtext::TimedTextStrategy;

/// One concrete method of obtaining text for a target.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// Capability tag used in failure aggregation and diagnostics.
    fn name(&self) -> &'static str;

    /// Make a single attempt. Never panics past this boundary; every
    /// internal error (network, non-2xx, unparseable or empty body)
    /// becomes an `AcquireError`.
    async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError>;
}

/// Default strategy chain for video targets.
pub fn video_chain(client: &Client, config: &AcquireConfig) -> Vec<Box<dyn AcquisitionStrategy>> {
    let mut chain: Vec<Box<dyn AcquisitionStrategy>> = vec![
        Box::new(PlayerStrategy::new(client.clone())),
        Box::new(LemnosStrategy::new(client.clone())),
        Box::new(TimedTextStrategy::new(client.clone())),
        Box::new(PipedStrategy::new(
            client.clone(),
            config.piped_instances.clone(),
        )),
    ];
    if config.audio_transcription_enabled {
        chain.push(Box::new(AudioTranscriptionStrategy::new(
            client.clone(),
            config,
        )));
    }
    // Terminal, highest-availability, lowest-fidelity strategy.
    chain.push(Box::new(MetadataStrategy::new(client.clone())));
    chain
}

/// Default strategy chain for post targets.
pub fn post_chain(client: &Client, _config: &AcquireConfig) -> Vec<Box<dyn AcquisitionStrategy>> {
    vec![
        Box::new(FixTweetStrategy::new(client.clone())),
        Box::new(SyndicationStrategy::new(client.clone())),
    ]
}

/// Caption endpoints default to a timed-XML payload; ask for WEBVTT
/// unless the locator already pins a format.
pub(crate) fn ensure_vtt_format(url: &str) -> String {
    if url.contains("fmt=") {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}fmt=vtt")
}
