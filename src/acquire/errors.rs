// Error types for acquisition strategies

use thiserror::Error;

/// Errors produced inside a single strategy attempt. These never escape
/// the orchestrator as panics or transport errors; the orchestrator
/// records the rendered reason and moves on to the next strategy.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Transport-level failure (connect error, timeout, bad TLS)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("{url} -> status {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// Body was present but could not be interpreted
    #[error("{0}")]
    Payload(String),

    /// The source enumerated zero caption tracks
    #[error("empty caption tracks")]
    NoCaptionTracks,

    /// Parsing succeeded but yielded no transcript fragments
    #[error("empty transcript after parsing")]
    EmptyTranscript,

    /// Strategy is switched off by configuration
    #[error("strategy disabled: {0}")]
    Disabled(&'static str),

    /// A required external binary is missing
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// External command failed to run or exited non-zero
    #[error("execution failed: {0}")]
    Execution(String),

    /// Bounded per-call timeout elapsed
    #[error("timed out after {0}s")]
    Timeout(u64),
}
