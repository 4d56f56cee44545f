//! Evidence normalization.
//!
//! Providers speak their own score conventions: a reputation service reports
//! *credibility* (1 = trustworthy), an image forensics model reports
//! *manipulation probability*, a fact-check lookup reports a rating. The
//! normalizer converts each typed output at the boundary into the shared
//! fake-leaning `Signal` convention so the aggregation engine never sees
//! provider-specific shapes.

mod mapping;
mod output;

pub use mapping::{NormalizerConfig, ScoreMapping};
pub use output::{ClaimRating, ProviderOutput, RawResult};

use tracing::warn;

use crate::signal::{Signal, SignalKind};

/// Converts raw provider results into signals.
///
/// Pure: holds only the mapping tables fixed at configuration time.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer with the given mapping tables.
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one provider result for the given signal kind.
    ///
    /// Never fails: absent results become absent signals, out-of-range values
    /// are clamped and flagged in the signal detail, and an output of the
    /// wrong variant for `kind` is treated as absent.
    #[must_use]
    pub fn normalize(&self, provider: &str, kind: SignalKind, raw: RawResult) -> Signal {
        let output = match raw {
            RawResult::Absent { reason } => {
                return Signal::absent(kind, format!("{provider}: {reason}"));
            }
            RawResult::Available(output) => output,
        };

        if output.kind() != kind {
            warn!(
                provider,
                expected = %kind,
                actual = %output.kind(),
                "provider returned mismatched output variant"
            );
            return Signal::absent(
                kind,
                format!("{provider}: mismatched output ({} for {kind})", output.kind()),
            );
        }

        let signal = match output {
            ProviderOutput::FactCheck {
                rating,
                match_confidence,
                claim,
            } => {
                let Some(score) = rating.fake_score() else {
                    return Signal::absent(kind, format!("{provider}: claim '{claim}' unverifiable"));
                };
                Signal::present(
                    kind,
                    score,
                    match_confidence,
                    format!("{provider}: claim '{claim}' rated {rating}"),
                )
            }
            ProviderOutput::SourceReputation {
                credibility,
                confidence,
                category,
            } => {
                let (score, note) = self.config.mapping_for(kind).apply(credibility);
                let signal = Signal::present(
                    kind,
                    score,
                    confidence,
                    format!("{provider}: credibility {credibility:.2} ({category})"),
                );
                with_optional_note(signal, note)
            }
            ProviderOutput::Sentiment {
                sensationalism,
                polarity,
                confidence,
                emotion,
            } => {
                let (score, note) = self.config.mapping_for(kind).apply(sensationalism);
                let mut detail =
                    format!("{provider}: sensationalism {sensationalism:.2}, polarity {polarity:+.2}");
                if let Some(emotion) = emotion {
                    detail.push_str(&format!(", dominant emotion {emotion}"));
                }
                let signal = Signal::present(kind, score, confidence, detail);
                with_optional_note(signal, note)
            }
            ProviderOutput::ImageAuthenticity {
                manipulation_probability,
                confidence,
            } => {
                let (score, note) = self
                    .config
                    .mapping_for(kind)
                    .apply(manipulation_probability);
                let signal = Signal::present(
                    kind,
                    score,
                    confidence,
                    format!("{provider}: manipulation probability {manipulation_probability:.2}"),
                );
                with_optional_note(signal, note)
            }
        };

        if signal.detail().contains("clamped") {
            warn!(provider, %kind, detail = signal.detail(), "malformed provider output clamped");
        }
        signal
    }
}

fn with_optional_note(signal: Signal, note: Option<String>) -> Signal {
    match note {
        Some(n) => signal.with_note(&n),
        None => signal,
    }
}
