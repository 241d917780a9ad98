pub mod acquire;

pub use acquire::{
    classify, AcquireConfig, AcquireError, AcquisitionStrategy, CaptionTrack, Category, ChainFailure,
    Platform, ResolvedText, Resolver, RetrievalTarget, StrategyFailure, TranscriptFragment,
    TtlCache,
};
