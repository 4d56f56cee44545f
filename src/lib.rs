//! # Verity - multi-signal credibility aggregation
//!
//! Verity decides how likely a news article is to be fake by combining
//! independent, unreliable pieces of evidence: fact-check matches, publisher
//! reputation, image authenticity and sentiment manipulation. Each piece may
//! be missing, late or low-confidence; Verity aggregates what is available and
//! reports how much of the expected evidence backed its verdict.
//!
//! ## Core Concepts
//!
//! - **Signal**: one normalized piece of evidence, fake-leaning score in `[0, 1]`
//!   with a confidence in `[0, 1]`
//! - **Fingerprint**: stable identifier derived from an article's normalized
//!   text and source URL
//! - **Verdict**: aggregated fake probability, overall confidence, label and
//!   rationale for one article
//! - **Base weight**: configured importance of a signal kind before confidence
//!   scaling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use verity::{Article, VerityEngine};
//!
//! let engine = VerityEngine::with_defaults()?;
//! let article = engine
//!     .prepare(
//!         Article::builder()
//!             .title("NASA Warns of November Blackout Due to Planetary Alignment")
//!             .text("NASA confirms that a planetary alignment will cause a nationwide blackout.")
//!             .source_url("fakenewsmedia.net/nasa-blackout-warning"),
//!     )
//!     .await?;
//!
//! let verdict = engine.analyze(&article).await?;
//! println!("{verdict}");
//! for line in &verdict.rationale {
//!     println!("  {line}");
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod article;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod signal;

pub use aggregate::{AggregationConfig, Aggregator, BaseWeights, Contribution, Verdict, VerdictLabel};
pub use article::{Article, ArticleBuilder, Fingerprint};
pub use cache::{CacheConfig, CacheStats, Computed, VerdictCache};
pub use confidence::Confidence;
pub use config::{ProviderConfig, VerityConfig};
pub use engine::{VerityEngine, VerityEngineBuilder};
pub use error::{ExecutionError, ValidationError, VerityError, VerityResult};
pub use normalize::{ClaimRating, Normalizer, NormalizerConfig, ProviderOutput, RawResult, ScoreMapping};
pub use provider::{
    DomainReputationProvider, HoaxPatternProvider, LexiconSentimentProvider, SignalProvider, TextNormalizer,
};
pub use signal::{Signal, SignalKind};

/// Re-exported so callers can cancel analyses without naming `tokio_util`.
pub use tokio_util::sync::CancellationToken;
