//! Signals: normalized evidence items.
//!
//! A `Signal` is what the aggregation engine consumes. Every provider output,
//! whatever its native shape, is reduced to one signal with a fake-leaning
//! score in `[0, 1]`, a confidence in `[0, 1]`, and a presence flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

/// Neutral score used for absent evidence.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Kind of evidence a signal carries.
///
/// The declaration order is the canonical tie-break order used when sorting
/// contributions: fact check, source reputation, image authenticity, sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Match against a fact-check database.
    FactCheck,

    /// Reputation of the publishing source.
    SourceReputation,

    /// Authenticity of attached imagery.
    ImageAuthenticity,

    /// Sentiment manipulation / sensationalism.
    Sentiment,
}

impl SignalKind {
    /// All kinds in canonical order.
    pub const ALL: [Self; 4] = [
        Self::FactCheck,
        Self::SourceReputation,
        Self::ImageAuthenticity,
        Self::Sentiment,
    ];

    /// Returns a short stable identifier suitable for logging/config keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FactCheck => "fact_check",
            Self::SourceReputation => "source_reputation",
            Self::ImageAuthenticity => "image_authenticity",
            Self::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized piece of evidence about an article.
///
/// Signals are immutable once built. Constructors keep `score` and
/// `confidence` inside `[0, 1]`; anything that had to be corrected is noted
/// in `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SignalRecord")]
pub struct Signal {
    kind: SignalKind,
    score: f64,
    confidence: Confidence,
    present: bool,
    detail: String,
}

impl Signal {
    /// Builds a present signal, clamping out-of-range values.
    ///
    /// A non-finite score cannot be interpreted and yields an absent signal.
    #[must_use]
    pub fn present(kind: SignalKind, score: f64, confidence: f64, detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if !score.is_finite() {
            return Self::absent(kind, format!("non-finite score from provider ({detail})"));
        }

        let clamped_score = score.clamp(0.0, 1.0);
        if !(0.0..=1.0).contains(&score) {
            push_note(&mut detail, &format!("clamped score {score} into [0, 1]"));
        }

        let (confidence_value, confidence_changed) = Confidence::clamped(confidence);
        if confidence_changed {
            push_note(&mut detail, &format!("clamped confidence {confidence} into [0, 1]"));
        }

        Self {
            kind,
            score: clamped_score,
            confidence: confidence_value,
            present: true,
            detail,
        }
    }

    /// Builds an absent signal: neutral score, zero confidence.
    #[must_use]
    pub fn absent(kind: SignalKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            score: NEUTRAL_SCORE,
            confidence: Confidence::zero(),
            present: false,
            detail: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Fake-leaning score: 0 = authentic, 1 = fake.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Whether the provider produced a result at all.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Aggregation weight for this signal given its kind's base weight.
    ///
    /// Absent signals always weigh zero.
    #[must_use]
    pub fn weight(&self, base_weight: f64) -> f64 {
        if self.present {
            base_weight * self.confidence.value()
        } else {
            0.0
        }
    }

    /// Returns a copy with an extra note appended to `detail`.
    #[must_use]
    pub fn with_note(mut self, note: &str) -> Self {
        push_note(&mut self.detail, note);
        self
    }
}

fn push_note(detail: &mut String, note: &str) {
    if detail.is_empty() {
        detail.push_str(note);
    } else {
        detail.push_str("; ");
        detail.push_str(note);
    }
}

/// Wire shape of a signal; deserialization re-applies constructor clamping.
#[derive(Deserialize)]
struct SignalRecord {
    kind: SignalKind,
    #[serde(default = "neutral")]
    score: f64,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    present: bool,
    #[serde(default)]
    detail: String,
}

fn neutral() -> f64 {
    NEUTRAL_SCORE
}

impl From<SignalRecord> for Signal {
    fn from(r: SignalRecord) -> Self {
        if r.present {
            Self::present(r.kind, r.score, r.confidence, r.detail)
        } else {
            Self::absent(r.kind, r.detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_follows_declaration() {
        let mut kinds = vec![
            SignalKind::Sentiment,
            SignalKind::ImageAuthenticity,
            SignalKind::FactCheck,
            SignalKind::SourceReputation,
        ];
        kinds.sort();
        assert_eq!(kinds, SignalKind::ALL.to_vec());
    }

    #[test]
    fn absent_signal_is_neutral_and_weightless() {
        let s = Signal::absent(SignalKind::ImageAuthenticity, "no image attached");
        assert!(!s.is_present());
        assert_eq!(s.score(), NEUTRAL_SCORE);
        assert!(s.confidence().is_zero());
        assert_eq!(s.weight(0.2), 0.0);
        assert_eq!(s.detail(), "no image attached");
    }

    #[test]
    fn present_signal_clamps_and_flags() {
        let s = Signal::present(SignalKind::Sentiment, 1.4, -0.2, "lexicon");
        assert!(s.is_present());
        assert_eq!(s.score(), 1.0);
        assert_eq!(s.confidence().value(), 0.0);
        assert!(s.detail().contains("clamped score"));
        assert!(s.detail().contains("clamped confidence"));
    }

    #[test]
    fn nan_score_becomes_absent() {
        let s = Signal::present(SignalKind::FactCheck, f64::NAN, 0.9, "bad");
        assert!(!s.is_present());
        assert!(s.detail().contains("non-finite"));
    }

    #[test]
    fn weight_scales_base_by_confidence() {
        let s = Signal::present(SignalKind::FactCheck, 0.9, 0.5, "");
        assert!((s.weight(0.4) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn deserialization_clamps() {
        let s: Signal = serde_json::from_str(
            r#"{"kind":"source_reputation","score":2.0,"confidence":0.7,"present":true,"detail":""}"#,
        )
        .unwrap();
        assert_eq!(s.kind(), SignalKind::SourceReputation);
        assert_eq!(s.score(), 1.0);
        assert!(s.detail().contains("clamped"));

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "source_reputation");
    }
}
