use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::signal::SignalKind;

/// Configured evidentiary strength of each signal kind before confidence scaling.
///
/// Defaults reflect how directly each kind speaks to falsity: a fact-check
/// match is the strongest, sentiment the weakest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseWeights {
    pub fact_check: f64,
    pub source_reputation: f64,
    pub image_authenticity: f64,
    pub sentiment: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            fact_check: 0.4,
            source_reputation: 0.3,
            image_authenticity: 0.2,
            sentiment: 0.1,
        }
    }
}

impl BaseWeights {
    /// Base weight of a kind.
    #[must_use]
    pub const fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::FactCheck => self.fact_check,
            SignalKind::SourceReputation => self.source_reputation,
            SignalKind::ImageAuthenticity => self.image_authenticity,
            SignalKind::Sentiment => self.sentiment,
        }
    }

    /// Sum over all kinds: the weight of a complete, fully confident evidence set.
    #[must_use]
    pub fn total(&self) -> f64 {
        SignalKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    /// Validation rules:
    /// - every weight finite and non-negative;
    /// - at least one weight positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for kind in SignalKind::ALL {
            let value = self.get(kind);
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidWeight {
                    kind: kind.to_string(),
                    value,
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(ValidationError::InvalidConfig {
                reason: "at least one base weight must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Aggregation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub weights: BaseWeights,
    /// Below this overall confidence every verdict is `uncertain`.
    pub min_confidence_threshold: f64,
    /// `fake_probability >= fake_threshold` is `likely_fake`.
    pub fake_threshold: f64,
    /// `fake_probability <= real_threshold` is `likely_real`.
    pub real_threshold: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            weights: BaseWeights::default(),
            min_confidence_threshold: 0.3,
            fake_threshold: 0.65,
            real_threshold: 0.35,
        }
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.weights.validate()?;

        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ValidationError::InvalidThreshold {
                    name: name.to_string(),
                    reason: format!("{v} is outside [0, 1]"),
                })
            }
        };
        unit("min_confidence_threshold", self.min_confidence_threshold)?;
        unit("fake_threshold", self.fake_threshold)?;
        unit("real_threshold", self.real_threshold)?;

        if self.real_threshold >= self.fake_threshold {
            return Err(ValidationError::InvalidThreshold {
                name: "real_threshold".to_string(),
                reason: format!(
                    "must be below fake_threshold ({} >= {})",
                    self.real_threshold, self.fake_threshold
                ),
            });
        }
        Ok(())
    }
}
