// Resilient content acquisition pipeline: fallback orchestration over
// per-platform strategy chains, with caching and failure classification.

pub mod cache;
pub mod captions;
pub mod classify;
pub mod config;
pub mod errors;
pub mod language;
pub mod models;
pub mod orchestrator;
pub mod strategies;
pub(crate) mod util;

pub use cache::TtlCache;
pub use classify::{classify, Category};
pub use config::AcquireConfig;
pub use errors::AcquireError;
pub use models::{
    CaptionTrack, ChainFailure, Platform, ResolvedText, RetrievalTarget, StrategyFailure,
    TranscriptFragment,
};
pub use orchestrator::Resolver;
pub use strategies::AcquisitionStrategy;
