// Fallback orchestrator
//
// Walks the strategy chain strictly in order: each strategy runs to
// completion before the next starts, so an early success avoids every
// later (slower, more speculative) call. Each strategy gets exactly one
// attempt per resolve; retry policy belongs to the caller.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::TtlCache;
use super::config::AcquireConfig;
use super::errors::AcquireError;
use super::models::{ChainFailure, Platform, ResolvedText, RetrievalTarget, StrategyFailure};
use super::strategies::{self, AcquisitionStrategy};
use super::util::build_client;

pub struct Resolver {
    cache: TtlCache<ResolvedText>,
    config: AcquireConfig,
    video_chain: Vec<Box<dyn AcquisitionStrategy>>,
    post_chain: Vec<Box<dyn AcquisitionStrategy>>,
}

impl Resolver {
    /// Build a resolver with the default per-platform chains. Fails only
    /// when the HTTP client cannot be constructed.
    pub fn new(config: AcquireConfig) -> Result<Self, AcquireError> {
        let client = build_client(&config)?;
        let video_chain = strategies::video_chain(&client, &config);
        let post_chain = strategies::post_chain(&client, &config);
        Ok(Self {
            cache: TtlCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_max_items,
            ),
            config,
            video_chain,
            post_chain,
        })
    }

    /// Resolve a target through its platform's default chain.
    pub async fn resolve(&self, target: &RetrievalTarget) -> Result<ResolvedText, ChainFailure> {
        let chain = match target.platform() {
            Platform::Video => &self.video_chain,
            Platform::Post => &self.post_chain,
        };
        self.resolve_with_chain(target, chain).await
    }

    /// Resolve through an explicit chain. Latency-sensitive callers pass
    /// a truncated chain to skip slow strategies.
    pub async fn resolve_with_chain(
        &self,
        target: &RetrievalTarget,
        chain: &[Box<dyn AcquisitionStrategy>],
    ) -> Result<ResolvedText, ChainFailure> {
        let cache_key = target.cache_key();
        if let Some(hit) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "cache hit, skipping strategy chain");
            return Ok(hit);
        }

        let target = self.with_language_fallback(target);
        let mut attempts: Vec<StrategyFailure> = Vec::new();
        for strategy in chain {
            debug!(strategy = strategy.name(), "trying strategy");
            match strategy.attempt(&target).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        warn!(strategy = strategy.name(), "strategy returned empty text");
                        attempts.push(StrategyFailure {
                            strategy: strategy.name(),
                            reason: "empty result".to_string(),
                        });
                        continue;
                    }
                    let resolved = ResolvedText {
                        text,
                        source_strategy: strategy.name(),
                    };
                    self.cache.set(cache_key, resolved.clone());
                    info!(
                        strategy = strategy.name(),
                        failed_attempts = attempts.len(),
                        "target resolved"
                    );
                    return Ok(resolved);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "strategy failed");
                    attempts.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let failure = ChainFailure { attempts };
        warn!(category = %failure.category(), "strategy chain exhausted");
        Err(failure)
    }

    /// Targets without an explicit language preference inherit the
    /// configured one, so track selection stays deterministic instead
    /// of defaulting to whatever order the upstream lists tracks in.
    fn with_language_fallback(&self, target: &RetrievalTarget) -> RetrievalTarget {
        if target.preferred_languages().is_empty() && !self.config.preferred_languages.is_empty() {
            return RetrievalTarget::new(
                target.platform(),
                target.identifier(),
                self.config.preferred_languages.clone(),
            );
        }
        target.clone()
    }

    /// User-facing diagnostic for a failed resolve, honoring the
    /// configured debug flag.
    pub fn diagnostic(&self, failure: &ChainFailure) -> String {
        failure.diagnostic(self.config.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::classify::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedStrategy {
        name: &'static str,
        outcome: Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedStrategy {
        fn boxed(
            name: &'static str,
            outcome: Result<&str, &str>,
        ) -> (Box<dyn AcquisitionStrategy>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = ScriptedStrategy {
                name,
                outcome: outcome.map(str::to_string).map_err(str::to_string),
                calls: calls.clone(),
            };
            (Box::new(strategy), calls)
        }
    }

    #[async_trait]
    impl AcquisitionStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _target: &RetrievalTarget) -> Result<String, AcquireError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(AcquireError::Payload(reason.clone())),
            }
        }
    }

    fn resolver(cache_ttl_secs: u64) -> Resolver {
        Resolver::new(AcquireConfig {
            cache_ttl_secs,
            ..AcquireConfig::default()
        })
        .unwrap()
    }

    fn target() -> RetrievalTarget {
        RetrievalTarget::new(Platform::Video, "dQw4w9WgXcQ", vec![])
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let (first, first_calls) = ScriptedStrategy::boxed("first", Err("boom"));
        let (second, second_calls) = ScriptedStrategy::boxed("second", Err("bang"));
        let (third, third_calls) = ScriptedStrategy::boxed("third", Ok("hello"));
        let (fourth, fourth_calls) = ScriptedStrategy::boxed("fourth", Ok("never"));
        let chain = vec![first, second, third, fourth];

        let resolved = resolver(0)
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();

        assert_eq!(resolved.text, "hello");
        assert_eq!(resolved.source_strategy, "third");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fourth_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_every_attempt_in_order() {
        let (first, _) = ScriptedStrategy::boxed("first", Err("status 429 from upstream"));
        let (second, _) = ScriptedStrategy::boxed("second", Err("empty caption tracks"));
        let chain = vec![first, second];

        let failure = resolver(0)
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap_err();

        assert_eq!(failure.attempts.len(), 2);
        assert_eq!(failure.attempts[0].strategy, "first");
        assert_eq!(failure.attempts[1].strategy, "second");
        assert_eq!(failure.category(), Category::BotBlocked);
    }

    #[tokio::test]
    async fn test_empty_success_counts_as_failure() {
        let (empty, _) = ScriptedStrategy::boxed("empty", Ok("   "));
        let (real, _) = ScriptedStrategy::boxed("real", Ok("content"));
        let chain = vec![empty, real];

        let resolved = resolver(0)
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();
        assert_eq!(resolved.source_strategy, "real");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_chain() {
        let resolver = resolver(3600);
        let (strategy, calls) = ScriptedStrategy::boxed("only", Ok("cached text"));
        let chain = vec![strategy];

        let first = resolver
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();
        let second = resolver
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(second.source_strategy, "only");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_walks_the_chain_every_time() {
        let resolver = resolver(0);
        let (strategy, calls) = ScriptedStrategy::boxed("only", Ok("text"));
        let chain = vec![strategy];

        resolver
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();
        resolver
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let resolver = resolver(3600);
        let (strategy, calls) = ScriptedStrategy::boxed("only", Err("boom"));
        let chain = vec![strategy];

        assert!(resolver.resolve_with_chain(&target(), &chain).await.is_err());
        assert!(resolver.resolve_with_chain(&target(), &chain).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_target_without_languages_inherits_configured_preference() {
        #[derive(Default)]
        struct LanguageRecorder {
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl AcquisitionStrategy for Arc<LanguageRecorder> {
            fn name(&self) -> &'static str {
                "recorder"
            }

            async fn attempt(&self, target: &RetrievalTarget) -> Result<String, AcquireError> {
                *self.seen.lock().unwrap() = target.preferred_languages().to_vec();
                Ok("text".to_string())
            }
        }

        let resolver = Resolver::new(AcquireConfig {
            cache_ttl_secs: 0,
            preferred_languages: vec!["zh".to_string(), "en".to_string()],
            ..AcquireConfig::default()
        })
        .unwrap();

        let recorder = Arc::new(LanguageRecorder::default());
        let chain: Vec<Box<dyn AcquisitionStrategy>> = vec![Box::new(recorder.clone())];

        // Empty target list inherits the configured preference.
        resolver
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap();
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["zh".to_string(), "en".to_string()]
        );

        // An explicit target list is left alone.
        let explicit = RetrievalTarget::new(Platform::Video, "dQw4w9WgXcQ", vec!["ja".to_string()]);
        resolver
            .resolve_with_chain(&explicit, &chain)
            .await
            .unwrap();
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["ja".to_string()]);
    }

    #[tokio::test]
    async fn test_diagnostic_respects_debug_flag() {
        let (strategy, _) = ScriptedStrategy::boxed("only", Err("status 429"));
        let chain = vec![strategy];

        let terse = resolver(0);
        let failure = terse
            .resolve_with_chain(&target(), &chain)
            .await
            .unwrap_err();
        assert_eq!(terse.diagnostic(&failure), "content unavailable (bot-blocked)");

        let verbose = Resolver::new(AcquireConfig {
            cache_ttl_secs: 0,
            debug: true,
            ..AcquireConfig::default()
        })
        .unwrap();
        let detail = verbose.diagnostic(&failure);
        assert!(detail.contains("bot-blocked"));
        assert!(detail.contains("only: status 429"));
    }
}
