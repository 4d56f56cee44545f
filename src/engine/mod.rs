//! Verity analysis engine.
//!
//! `VerityEngine` ties the pieces together: it runs the registered providers
//! concurrently, normalizes their output, aggregates the signals into a
//! verdict and memoizes the verdict by article fingerprint. Concurrent
//! requests for the same article share one computation.

mod collect;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{Aggregator, Verdict};
use crate::article::{Article, ArticleBuilder, Fingerprint};
use crate::cache::{CacheStats, Computed, VerdictCache};
use crate::config::VerityConfig;
use crate::error::{ExecutionError, ValidationError, VerityResult};
use crate::normalize::Normalizer;
use crate::provider::{builtin_providers, SignalProvider, TextNormalizer};

use collect::{collect_signals, Interruption};

/// Builder for [`VerityEngine`].
#[derive(Default)]
pub struct VerityEngineBuilder {
    config: VerityConfig,
    providers: Vec<Arc<dyn SignalProvider>>,
    text_normalizer: Option<Arc<dyn TextNormalizer>>,
}

impl VerityEngineBuilder {
    #[must_use]
    pub fn config(mut self, config: VerityConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a provider.
    #[must_use]
    pub fn provider(mut self, provider: impl SignalProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Registers a shared provider.
    #[must_use]
    pub fn provider_arc(mut self, provider: Arc<dyn SignalProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Registers the built-in rule-based providers.
    pub fn with_builtin_providers(mut self) -> VerityResult<Self> {
        self.providers.extend(builtin_providers()?);
        Ok(self)
    }

    /// Sets the collaborator used by [`VerityEngine::prepare`].
    #[must_use]
    pub fn text_normalizer(mut self, normalizer: impl TextNormalizer + 'static) -> Self {
        self.text_normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Validates the configuration and builds the engine.
    ///
    /// # Errors
    ///
    /// - any configuration `ValidationError`
    /// - `InvalidConfig` if two providers share a name
    pub fn build(self) -> VerityResult<VerityEngine> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.name().to_string()) {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("provider name '{}' registered twice", provider.name()),
                }
                .into());
            }
        }

        let aggregator = Aggregator::new(self.config.aggregation.clone())?;
        let cache = VerdictCache::new(&self.config.cache)?;
        let normalizer = Normalizer::new(self.config.normalizer.clone());

        Ok(VerityEngine {
            config: self.config,
            providers: self.providers,
            text_normalizer: self.text_normalizer,
            normalizer,
            aggregator,
            cache,
        })
    }
}

/// The analysis entry point.
pub struct VerityEngine {
    config: VerityConfig,
    providers: Vec<Arc<dyn SignalProvider>>,
    text_normalizer: Option<Arc<dyn TextNormalizer>>,
    normalizer: Normalizer,
    aggregator: Aggregator,
    cache: VerdictCache,
}

impl fmt::Debug for VerityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerityEngine")
            .field("providers", &self.provider_names())
            .field("text_normalizer", &self.text_normalizer.is_some())
            .field("cache_len", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl VerityEngine {
    #[must_use]
    pub fn builder() -> VerityEngineBuilder {
        VerityEngineBuilder::default()
    }

    /// Engine with default configuration and the built-in providers.
    pub fn with_defaults() -> VerityResult<Self> {
        Self::builder().with_builtin_providers()?.build()
    }

    #[must_use]
    pub fn config(&self) -> &VerityConfig {
        &self.config
    }

    /// Names of the registered providers, in registration order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    #[must_use]
    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Builds an article, running the text normalizer first when one is set.
    ///
    /// A failing normalizer is not fatal: the article falls back to its
    /// whitespace-collapsed raw text.
    pub async fn prepare(&self, builder: ArticleBuilder) -> VerityResult<Article> {
        let normalized = match (&self.text_normalizer, builder.raw_text()) {
            (Some(normalizer), Some(text)) => {
                match normalizer.normalize(text, builder.declared_language()).await {
                    Ok(normalized) => Some(normalized),
                    Err(err) => {
                        warn!(error = %err, "text normalization failed; using raw text");
                        None
                    }
                }
            }
            _ => None,
        };
        let builder = match normalized {
            Some(text) => builder.normalized_text(text),
            None => builder,
        };
        Ok(builder.build()?)
    }

    /// Cached verdict for a fingerprint, if still live.
    #[must_use]
    pub fn verdict_for(&self, fingerprint: &Fingerprint) -> Option<Arc<Verdict>> {
        self.cache.get(fingerprint)
    }

    /// Analyzes an article.
    ///
    /// Returns the cached verdict when one is live; otherwise runs every
    /// provider, aggregates and caches the result. Concurrent calls for the
    /// same article share a single computation. Provider failures never fail
    /// the call; they show up as missing evidence in the verdict.
    pub async fn analyze(&self, article: &Article) -> VerityResult<Arc<Verdict>> {
        self.run(article, None).await
    }

    /// Like [`analyze`](Self::analyze), but stops collecting provider results
    /// when `cancel` fires and aggregates what arrived so far. Such a partial
    /// verdict is returned to this caller only and is not cached. A caller
    /// waiting on another caller's analysis of the same article stops waiting
    /// and gets `Cancelled`.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the token fires before a verdict is available to this
    /// caller, either before the call or while waiting on a shared analysis.
    pub async fn analyze_with_cancel(&self, article: &Article, cancel: &CancellationToken) -> VerityResult<Arc<Verdict>> {
        if cancel.is_cancelled() {
            return self
                .cache
                .get(&article.fingerprint())
                .ok_or_else(|| ExecutionError::Cancelled.into());
        }
        self.run(article, Some(cancel)).await
    }

    async fn run(&self, article: &Article, cancel: Option<&CancellationToken>) -> VerityResult<Arc<Verdict>> {
        let fingerprint = article.fingerprint();
        let span = info_span!(
            "analyze",
            request_id = %Uuid::new_v4(),
            fingerprint = %fingerprint.short(),
        );

        async move {
            let verdict = self
                .cache
                .get_or_compute_with_cancel(fingerprint, cancel, || self.compute(article, cancel))
                .await?;
            info!(
                label = %verdict.label,
                fake_probability = verdict.fake_probability,
                overall_confidence = verdict.overall_confidence,
                "analysis complete"
            );
            Ok(verdict)
        }
        .instrument(span)
        .await
    }

    async fn compute(&self, article: &Article, cancel: Option<&CancellationToken>) -> VerityResult<Computed> {
        let collected = collect_signals(&self.providers, article, &self.normalizer, &self.config.providers, cancel).await;
        let mut verdict = self.aggregator.aggregate(article, &collected.signals)?;

        Ok(match collected.interrupted {
            None => Computed::Shareable(verdict),
            Some(reason) => {
                verdict
                    .rationale
                    .push(format!("Partial evidence: {reason} before every provider answered."));
                warn!(%reason, label = %verdict.label, "verdict built from partial evidence");
                match reason {
                    Interruption::Deadline => Computed::Shareable(verdict),
                    Interruption::Cancelled => Computed::Private(verdict),
                }
            }
        })
    }
}
