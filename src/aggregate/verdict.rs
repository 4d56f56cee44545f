use std::fmt;

use serde::{Deserialize, Serialize};

use crate::article::Fingerprint;
use crate::signal::{Signal, SignalKind};

/// Final classification of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    LikelyFake,
    LikelyReal,
    Uncertain,
}

impl VerdictLabel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LikelyFake => "likely_fake",
            Self::LikelyReal => "likely_real",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal together with the weight it carried in the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub signal: Signal,

    /// `base_weight(kind) * confidence`.
    pub weight: f64,

    /// Fraction of the total weight (0.0 to 1.0).
    pub share: f64,
}

/// Aggregated fake-news determination for one article.
///
/// A verdict is a pure function of its inputs; it carries no timestamps so
/// repeated aggregation of the same signals is bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Fingerprint of the article this verdict describes.
    pub fingerprint: Fingerprint,

    /// Probability the article is fake (0.0 to 1.0).
    pub fake_probability: f64,

    /// How much of the expected evidence backed the probability (0.0 to 1.0).
    pub overall_confidence: f64,

    pub label: VerdictLabel,

    /// Weighted signals, heaviest first; ties in canonical kind order.
    #[serde(default)]
    pub contributing_signals: Vec<Contribution>,

    /// Kinds that were absent or carried zero weight.
    #[serde(default)]
    pub missing: Vec<SignalKind>,

    /// Human-readable explanation, one line per fact.
    #[serde(default)]
    pub rationale: Vec<String>,
}

impl Verdict {
    /// The no-evidence verdict: neutral probability, zero confidence.
    #[must_use]
    pub fn uncertain(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            fake_probability: 0.5,
            overall_confidence: 0.0,
            label: VerdictLabel::Uncertain,
            contributing_signals: Vec::new(),
            missing: SignalKind::ALL.to_vec(),
            rationale: Vec::new(),
        }
    }

    /// The heaviest contribution, if any evidence was weighted.
    #[must_use]
    pub fn dominant_signal(&self) -> Option<&Contribution> {
        self.contributing_signals.first()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (p_fake={:.3}, confidence={:.3})",
            self.label, self.fake_probability, self.overall_confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncertain_verdict_shape() {
        let v = Verdict::uncertain(Fingerprint::from_bytes([7; 32]));
        assert_eq!(v.fake_probability, 0.5);
        assert_eq!(v.overall_confidence, 0.0);
        assert_eq!(v.label, VerdictLabel::Uncertain);
        assert_eq!(v.missing.len(), 4);
        assert!(v.dominant_signal().is_none());
    }

    #[test]
    fn label_serializes_snake_case() {
        let json = serde_json::to_string(&VerdictLabel::LikelyFake).unwrap();
        assert_eq!(json, "\"likely_fake\"");
    }

    #[test]
    fn verdict_json_contains_hex_fingerprint() {
        let v = Verdict::uncertain(Fingerprint::from_bytes([0xab; 32]));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["label"], "uncertain");
        assert!(json["fingerprint"].as_str().unwrap().starts_with("abab"));

        let back: Verdict = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn display_is_compact() {
        let v = Verdict::uncertain(Fingerprint::from_bytes([0; 32]));
        assert_eq!(v.to_string(), "uncertain (p_fake=0.500, confidence=0.000)");
    }
}
