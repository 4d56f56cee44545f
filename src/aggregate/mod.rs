//! Multi-signal aggregation.
//!
//! Combines normalized signals into a [`Verdict`]:
//!
//! - `weight_i = base_weight(kind_i) * confidence_i` for present signals;
//!   absent signals weigh zero and never pull the result either way.
//! - `fake_probability = Σ(weight_i * score_i) / Σ weight_i`, kept inside the
//!   range of the weighted scores.
//! - `overall_confidence = Σ weight_i / Σ base_weight` over every kind, so
//!   confidence drops as expected evidence goes missing.
//!
//! Aggregation is pure and synchronous: the same signals always produce the
//! same verdict, and missing evidence is a normal input, not an error.

mod config;
mod verdict;

pub use config::{AggregationConfig, BaseWeights};
pub use verdict::{Contribution, Verdict, VerdictLabel};

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::article::{Article, Fingerprint};
use crate::error::{ExecutionError, ValidationError, VerityResult};
use crate::signal::{Signal, SignalKind};

/// Rounding slack for threshold comparisons. A weighted sum that lands on a
/// threshold in exact arithmetic may miss it by a few ulps in `f64`.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// The aggregation engine.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregationConfig,
}

/// The signal chosen for one kind, plus how many duplicates lost to it.
struct Selected<'a> {
    signal: &'a Signal,
    duplicates: usize,
}

impl Aggregator {
    /// Create an aggregator after validating its configuration.
    pub fn new(config: AggregationConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate signals about an article.
    ///
    /// # Errors
    ///
    /// `ExecutionError::InvalidInvocation` if `signals` is empty.
    pub fn aggregate(&self, article: &Article, signals: &[Signal]) -> VerityResult<Verdict> {
        self.aggregate_for(article.fingerprint(), signals)
    }

    /// Aggregate signals for an already-fingerprinted article.
    ///
    /// # Errors
    ///
    /// `ExecutionError::InvalidInvocation` if `signals` is empty.
    pub fn aggregate_for(&self, fingerprint: Fingerprint, signals: &[Signal]) -> VerityResult<Verdict> {
        if signals.is_empty() {
            return Err(ExecutionError::InvalidInvocation {
                reason: "aggregate called with an empty signal set".to_string(),
            }
            .into());
        }

        let selected = select_per_kind(signals);
        let weights = &self.config.weights;

        let mut contributions: Vec<Contribution> = Vec::with_capacity(selected.len());
        let mut missing: Vec<SignalKind> = Vec::new();
        let mut missing_notes: Vec<String> = Vec::new();
        let mut duplicate_notes: Vec<String> = Vec::new();

        // BTreeMap iteration is canonical kind order, so sums do not depend on
        // the order the caller supplied signals in.
        for kind in SignalKind::ALL {
            let Some(sel) = selected.get(&kind) else {
                missing.push(kind);
                missing_notes.push(format!("{kind}: not supplied"));
                continue;
            };
            if sel.duplicates > 0 {
                duplicate_notes.push(format!(
                    "{kind}: {} duplicate signal(s) ignored",
                    sel.duplicates
                ));
            }

            let signal = sel.signal;
            let weight = signal.weight(weights.get(kind));
            if weight > 0.0 && weight.is_finite() {
                contributions.push(Contribution {
                    signal: signal.clone(),
                    weight,
                    share: 0.0,
                });
            } else {
                missing.push(kind);
                let why = if !signal.is_present() {
                    "no evidence"
                } else if signal.confidence().is_zero() {
                    "zero confidence"
                } else {
                    "zero base weight"
                };
                if signal.detail().is_empty() {
                    missing_notes.push(format!("{kind}: {why}"));
                } else {
                    missing_notes.push(format!("{kind}: {why} ({})", signal.detail()));
                }
            }
        }

        let total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
        if total_weight <= 0.0 {
            let mut verdict = Verdict::uncertain(fingerprint);
            verdict.missing = missing;
            verdict.rationale.push(
                "No usable evidence: every signal was absent or carried zero confidence.".to_string(),
            );
            verdict.rationale.extend(missing_notes);
            verdict.rationale.extend(duplicate_notes);
            debug!(fingerprint = %fingerprint.short(), "aggregated without usable evidence");
            return Ok(verdict);
        }

        let fake_probability = weighted_probability(&contributions, total_weight);
        let overall_confidence = (total_weight / weights.total()).clamp(0.0, 1.0);
        let (label, forced) = self.label_for(fake_probability, overall_confidence);

        for c in &mut contributions {
            c.share = c.weight / total_weight;
        }
        contributions.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.signal.kind().cmp(&b.signal.kind()))
        });

        let mut rationale = Vec::with_capacity(contributions.len() + missing_notes.len() + 2);
        rationale.push(format!(
            "{label}: fake probability {fake_probability:.3} from {} of {} signal kinds, overall confidence {overall_confidence:.3}.",
            contributions.len(),
            SignalKind::ALL.len(),
        ));
        for c in &contributions {
            let s = &c.signal;
            rationale.push(format!(
                "{}: score {:.2} at confidence {:.2}, {:.1}% of weight ({}).",
                s.kind(),
                s.score(),
                s.confidence().value(),
                c.share * 100.0,
                s.detail()
            ));
        }
        rationale.extend(missing_notes);
        rationale.extend(duplicate_notes);
        if forced {
            rationale.push(format!(
                "Label forced to uncertain: overall confidence {overall_confidence:.3} is below the minimum {:.3}.",
                self.config.min_confidence_threshold
            ));
        }

        debug!(
            fingerprint = %fingerprint.short(),
            %label,
            fake_probability,
            overall_confidence,
            contributing = contributions.len(),
            "aggregated verdict"
        );

        Ok(Verdict {
            fingerprint,
            fake_probability,
            overall_confidence,
            label,
            contributing_signals: contributions,
            missing,
            rationale,
        })
    }

    /// Label for a probability/confidence pair, and whether low confidence
    /// overrode a decisive probability.
    /// Thresholds are inclusive up to [`THRESHOLD_TOLERANCE`].
    fn label_for(&self, fake_probability: f64, overall_confidence: f64) -> (VerdictLabel, bool) {
        let by_probability = if fake_probability >= self.config.fake_threshold - THRESHOLD_TOLERANCE {
            VerdictLabel::LikelyFake
        } else if fake_probability <= self.config.real_threshold + THRESHOLD_TOLERANCE {
            VerdictLabel::LikelyReal
        } else {
            VerdictLabel::Uncertain
        };

        if overall_confidence < self.config.min_confidence_threshold - THRESHOLD_TOLERANCE {
            (VerdictLabel::Uncertain, by_probability != VerdictLabel::Uncertain)
        } else {
            (by_probability, false)
        }
    }
}

/// Picks one signal per kind.
///
/// Preference: present over absent, then higher confidence, then higher
/// score, then earlier position. Independent of input order except for exact
/// duplicates.
fn select_per_kind(signals: &[Signal]) -> BTreeMap<SignalKind, Selected<'_>> {
    let mut out: BTreeMap<SignalKind, Selected<'_>> = BTreeMap::new();
    for signal in signals {
        match out.get_mut(&signal.kind()) {
            None => {
                out.insert(
                    signal.kind(),
                    Selected {
                        signal,
                        duplicates: 0,
                    },
                );
            }
            Some(current) => {
                current.duplicates += 1;
                if preferred(signal, current.signal) {
                    current.signal = signal;
                }
            }
        }
    }
    out
}

fn preferred(candidate: &Signal, current: &Signal) -> bool {
    if candidate.is_present() != current.is_present() {
        return candidate.is_present();
    }
    match candidate
        .confidence()
        .value()
        .total_cmp(&current.confidence().value())
    {
        Ordering::Equal => candidate.score() > current.score(),
        order => order == Ordering::Greater,
    }
}

/// Confidence-weighted mean of the contributing scores.
///
/// A single contribution returns its score exactly; otherwise the mean is
/// clamped into `[min, max]` of the scores so rounding can never leave the
/// convex hull of the evidence.
fn weighted_probability(contributions: &[Contribution], total_weight: f64) -> f64 {
    if let [only] = contributions {
        return only.signal.score();
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut weighted_sum = 0.0f64;
    for c in contributions {
        let s = c.signal.score();
        lo = lo.min(s);
        hi = hi.max(s);
        weighted_sum += c.weight * s;
    }
    (weighted_sum / total_weight).clamp(lo, hi)
}
