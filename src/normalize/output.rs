use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signal::SignalKind;

/// Verdict a fact-checker assigned to a matched claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRating {
    True,
    MostlyTrue,
    Mixed,
    MostlyFalse,
    False,
    /// The checker looked at the claim and could not rate it.
    Unverifiable,
}

impl ClaimRating {
    /// Fake-leaning score for the rating; `None` when the rating carries no evidence.
    #[must_use]
    pub const fn fake_score(&self) -> Option<f64> {
        match self {
            Self::True => Some(0.0),
            Self::MostlyTrue => Some(0.25),
            Self::Mixed => Some(0.5),
            Self::MostlyFalse => Some(0.75),
            Self::False => Some(1.0),
            Self::Unverifiable => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::MostlyTrue => "mostly_true",
            Self::Mixed => "mixed",
            Self::MostlyFalse => "mostly_false",
            Self::False => "false",
            Self::Unverifiable => "unverifiable",
        }
    }
}

impl fmt::Display for ClaimRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed output of a signal provider, one variant per signal kind.
///
/// Values are in each provider's native convention; the normalizer maps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderOutput {
    /// A fact-check database matched a claim in the article.
    FactCheck {
        rating: ClaimRating,
        /// How well the article matches the checked claim (0..1).
        match_confidence: f64,
        /// The matched claim or catalogue entry.
        claim: String,
    },

    /// Publisher reputation.
    SourceReputation {
        /// 1 = fully credible source.
        credibility: f64,
        confidence: f64,
        category: String,
    },

    /// Sentiment manipulation analysis.
    Sentiment {
        /// 1 = maximally sensational.
        sensationalism: f64,
        /// Overall tone in [-1, 1].
        polarity: f64,
        confidence: f64,
        /// Dominant emotion, if any was detected.
        #[serde(default)]
        emotion: Option<String>,
    },

    /// Image forensics.
    ImageAuthenticity {
        /// 1 = certainly manipulated.
        manipulation_probability: f64,
        confidence: f64,
    },
}

impl ProviderOutput {
    /// Signal kind this output variant belongs to.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::FactCheck { .. } => SignalKind::FactCheck,
            Self::SourceReputation { .. } => SignalKind::SourceReputation,
            Self::Sentiment { .. } => SignalKind::Sentiment,
            Self::ImageAuthenticity { .. } => SignalKind::ImageAuthenticity,
        }
    }
}

/// What came back from a provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Available(ProviderOutput),

    /// Timed out, unsupported language, no image, provider error...
    Absent { reason: String },
}

impl RawResult {
    #[must_use]
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl From<ProviderOutput> for RawResult {
    fn from(output: ProviderOutput) -> Self {
        Self::Available(output)
    }
}
