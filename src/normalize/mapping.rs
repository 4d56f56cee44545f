use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::signal::SignalKind;

/// How a provider's native value maps onto the fake-leaning `[0, 1]` scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ScoreMapping {
    /// Native value is already fake-leaning in `[0, 1]`.
    Direct,

    /// Native value is authenticity-leaning in `[0, 1]` (score = 1 - value).
    Inverted,

    /// Native value lives in `[min, max]`; rescaled, optionally inverted.
    Linear {
        min: f64,
        max: f64,
        #[serde(default)]
        invert: bool,
    },
}

impl ScoreMapping {
    /// Maps a native value.
    ///
    /// Returns the mapped score and, when the native value fell outside its
    /// declared range, a note describing the clamp.
    #[must_use]
    pub fn apply(&self, value: f64) -> (f64, Option<String>) {
        let (lo, hi, invert) = match *self {
            Self::Direct => (0.0, 1.0, false),
            Self::Inverted => (0.0, 1.0, true),
            Self::Linear { min, max, invert } => (min, max, invert),
        };

        if value.is_nan() {
            // Signal::present turns a non-finite score into an absent signal.
            return (f64::NAN, None);
        }

        let note = if (lo..=hi).contains(&value) {
            None
        } else {
            Some(format!("clamped native value {value} into [{lo}, {hi}]"))
        };
        let clamped = value.clamp(lo, hi);
        let unit = if hi > lo { (clamped - lo) / (hi - lo) } else { 0.5 };
        let score = if invert { 1.0 - unit } else { unit };
        (score, note)
    }

    fn validate(&self, kind: SignalKind) -> Result<(), ValidationError> {
        if let Self::Linear { min, max, .. } = *self {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ValidationError::InvalidConfig {
                    reason: format!(
                        "normalizer mapping for {kind} needs finite min < max (got {min}..{max})"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Per-kind score mapping tables.
///
/// Fact-check ratings map through a fixed table and are not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub source_reputation: ScoreMapping,
    pub sentiment: ScoreMapping,
    pub image_authenticity: ScoreMapping,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            source_reputation: ScoreMapping::Inverted,
            sentiment: ScoreMapping::Direct,
            image_authenticity: ScoreMapping::Direct,
        }
    }
}

impl NormalizerConfig {
    /// Mapping used for a kind.
    #[must_use]
    pub fn mapping_for(&self, kind: SignalKind) -> ScoreMapping {
        match kind {
            SignalKind::SourceReputation => self.source_reputation,
            SignalKind::Sentiment => self.sentiment,
            SignalKind::ImageAuthenticity => self.image_authenticity,
            SignalKind::FactCheck => ScoreMapping::Direct,
        }
    }

    /// Rejects degenerate linear ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source_reputation.validate(SignalKind::SourceReputation)?;
        self.sentiment.validate(SignalKind::Sentiment)?;
        self.image_authenticity.validate(SignalKind::ImageAuthenticity)?;
        Ok(())
    }
}
