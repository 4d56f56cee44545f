//! Concurrent signal collection.
//!
//! Every provider runs under its own timeout; the whole collection runs under
//! the analysis deadline and an optional cancellation token. Whatever has not
//! answered when collection stops becomes an absent signal.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::article::Article;
use crate::config::ProviderConfig;
use crate::error::ExecutionError;
use crate::normalize::{Normalizer, RawResult};
use crate::provider::SignalProvider;
use crate::signal::{Signal, SignalKind};

/// Why collection stopped before every provider answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interruption {
    Deadline,
    Cancelled,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline => f.write_str("analysis deadline exceeded"),
            Self::Cancelled => f.write_str("analysis cancelled"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Collected {
    /// One signal per provider plus an absent signal for each kind no
    /// provider covers. Never empty.
    pub signals: Vec<Signal>,
    pub interrupted: Option<Interruption>,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Runs one provider under its timeout and returns its raw result.
async fn run_provider(provider: &dyn SignalProvider, article: &Article, timeout: Duration) -> RawResult {
    let started = Instant::now();
    match tokio::time::timeout(timeout, provider.assess(article)).await {
        Ok(Ok(output)) => {
            debug!(
                provider = provider.name(),
                elapsed_ms = millis(started.elapsed()),
                "provider answered"
            );
            RawResult::Available(output)
        }
        Ok(Err(err)) => {
            if err.is_validation() || err.is_internal() {
                warn!(provider = provider.name(), error = %err, "provider failed");
            } else {
                debug!(provider = provider.name(), error = %err, "provider had no evidence");
            }
            RawResult::absent(err.to_string())
        }
        Err(_) => {
            let err = ExecutionError::ProviderTimeout {
                provider: provider.name().to_string(),
                timeout_ms: millis(timeout),
            };
            warn!(provider = provider.name(), timeout_ms = millis(timeout), "provider timed out");
            RawResult::absent(err.to_string())
        }
    }
}

/// Collects normalized signals from every provider.
pub(crate) async fn collect_signals(
    providers: &[Arc<dyn SignalProvider>],
    article: &Article,
    normalizer: &Normalizer,
    config: &ProviderConfig,
    cancel: Option<&CancellationToken>,
) -> Collected {
    let deadline = Instant::now() + config.analysis_deadline();

    let mut pending: FuturesUnordered<_> = providers
        .iter()
        .enumerate()
        .map(|(idx, provider)| {
            let timeout = config.timeout_for(provider.name());
            async move { (idx, run_provider(provider.as_ref(), article, timeout).await) }
        })
        .collect();

    let mut results: Vec<Option<Signal>> = vec![None; providers.len()];
    let interrupted = loop {
        tokio::select! {
            biased;
            () = cancelled(cancel) => break Some(Interruption::Cancelled),
            () = tokio::time::sleep_until(deadline) => break Some(Interruption::Deadline),
            next = pending.next() => match next {
                Some((idx, raw)) => {
                    let provider = &providers[idx];
                    results[idx] = Some(normalizer.normalize(provider.name(), provider.kind(), raw));
                }
                None => break None,
            },
        }
    };
    // Outstanding provider futures are dropped here.
    drop(pending);

    if let Some(reason) = interrupted {
        let outstanding = results.iter().filter(|r| r.is_none()).count();
        warn!(%reason, outstanding, "stopped collecting provider results");
    }

    let mut signals: Vec<Signal> = results
        .into_iter()
        .zip(providers)
        .map(|(result, provider)| {
            result.unwrap_or_else(|| {
                let reason = interrupted.map_or_else(|| "no result".to_string(), |i| i.to_string());
                Signal::absent(provider.kind(), format!("{}: {reason}", provider.name()))
            })
        })
        .collect();

    for kind in SignalKind::ALL {
        if !providers.iter().any(|p| p.kind() == kind) {
            signals.push(Signal::absent(kind, "no provider registered"));
        }
    }

    Collected {
        signals,
        interrupted,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{VerityError, VerityResult};
    use crate::normalize::ProviderOutput;

    struct Fixed {
        name: &'static str,
        delay: Duration,
        credibility: Option<f64>,
    }

    #[async_trait]
    impl SignalProvider for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> SignalKind {
            SignalKind::SourceReputation
        }

        async fn assess(&self, _article: &Article) -> VerityResult<ProviderOutput> {
            tokio::time::sleep(self.delay).await;
            match self.credibility {
                Some(credibility) => Ok(ProviderOutput::SourceReputation {
                    credibility,
                    confidence: 0.8,
                    category: "fixed".to_string(),
                }),
                None => Err(VerityError::unavailable(self.name, "down")),
            }
        }
    }

    fn article() -> Article {
        Article::builder()
            .text("Some article text.")
            .source_url("example.com/a")
            .build()
            .unwrap()
    }

    fn provider(name: &'static str, delay_ms: u64, credibility: Option<f64>) -> Arc<dyn SignalProvider> {
        Arc::new(Fixed {
            name,
            delay: Duration::from_millis(delay_ms),
            credibility,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn uncovered_kinds_become_absent() {
        let providers = vec![provider("fast", 1, Some(0.9))];
        let out = collect_signals(&providers, &article(), &Normalizer::default(), &ProviderConfig::default(), None).await;
        assert!(out.interrupted.is_none());
        assert_eq!(out.signals.len(), 4);
        assert!(out.signals[0].is_present());
        assert!(out.signals[1..].iter().all(|s| !s.is_present()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let providers = vec![provider("slow", 10_000, Some(0.9))];
        let mut config = ProviderConfig::default();
        config.timeouts_ms.insert("slow".to_string(), 100);
        let out = collect_signals(&providers, &article(), &Normalizer::default(), &config, None).await;
        assert!(!out.signals[0].is_present());
        assert!(out.signals[0].detail().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_provider_is_absent() {
        let providers = vec![provider("down", 1, None)];
        let out = collect_signals(&providers, &article(), &Normalizer::default(), &ProviderConfig::default(), None).await;
        assert!(!out.signals[0].is_present());
        assert!(out.signals[0].detail().contains("down"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_keeps_what_arrived() {
        let providers = vec![provider("fast", 10, Some(0.9)), provider("slow", 4_000, Some(0.1))];
        let config = ProviderConfig {
            analysis_deadline_ms: 1_000,
            ..ProviderConfig::default()
        };
        let out = collect_signals(&providers, &article(), &Normalizer::default(), &config, None).await;
        assert_eq!(out.interrupted, Some(Interruption::Deadline));
        assert!(out.signals[0].is_present());
        assert!(!out.signals[1].is_present());
        assert!(out.signals[1].detail().contains("deadline"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_collection() {
        let providers = vec![provider("slow", 60_000, Some(0.9))];
        let token = CancellationToken::new();
        token.cancel();
        let out = collect_signals(
            &providers,
            &article(),
            &Normalizer::default(),
            &ProviderConfig::default(),
            Some(&token),
        )
        .await;
        assert_eq!(out.interrupted, Some(Interruption::Cancelled));
        assert!(out.signals.iter().all(|s| !s.is_present()));
    }
}
