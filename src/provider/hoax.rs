//! Known hoax narratives matched by regular expression.

use std::fmt;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::article::Article;
use crate::error::{ValidationError, VerityError, VerityResult};
use crate::normalize::{ClaimRating, ProviderOutput};
use crate::provider::SignalProvider;
use crate::signal::SignalKind;

const PROVIDER_NAME: &str = "hoax_patterns";

const BASE_MATCH_CONFIDENCE: f64 = 0.5;
const PER_EXTRA_MATCH: f64 = 0.15;
const MAX_MATCH_CONFIDENCE: f64 = 0.9;

/// Narrative family of a hoax pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HoaxCategory {
    AstronomicalDisaster,
    HealthConspiracy,
    PoliticalConspiracy,
}

impl HoaxCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AstronomicalDisaster => "astronomical_disaster",
            Self::HealthConspiracy => "health_conspiracy",
            Self::PoliticalConspiracy => "political_conspiracy",
        }
    }
}

impl fmt::Display for HoaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CATALOGUE: &[(HoaxCategory, &str)] = &[
    (
        HoaxCategory::AstronomicalDisaster,
        r"\bplanet(?:ary)?\s+alignment\b.*\b(?:disaster|catastrophe|blackouts?)\b",
    ),
    (
        HoaxCategory::AstronomicalDisaster,
        r"\b(?:venus|mars|jupiter|saturn)\b.*\balign\w*\b.*\b(?:disaster|catastrophe|blackouts?|power\s+outages?)\b",
    ),
    (
        HoaxCategory::AstronomicalDisaster,
        r"\bcelestial\s+event\b.*\b(?:power\s+outages?|blackouts?)\b",
    ),
    (
        HoaxCategory::AstronomicalDisaster,
        r"\b(?:nasa|scientists)\b.*\b(?:covering\s+up|hiding|conceal\w*)\b.*\b(?:planet|asteroid|meteor)\b",
    ),
    (
        HoaxCategory::HealthConspiracy,
        r"\b(?:vaccines?|vaccination)\b.*\b(?:autism|mind\s+control|track\w*|chips?|5g)\b",
    ),
    (
        HoaxCategory::HealthConspiracy,
        r"\b(?:cure\s+for\s+cancer|cure\s+for\s+all\s+(?:diseases?|cancers?))\b.*\b(?:suppressed|hidden|secret)\b",
    ),
    (
        HoaxCategory::HealthConspiracy,
        r"\b(?:miracle\s+cure|miracle\s+mineral\s+solution|mms)\b",
    ),
    (
        HoaxCategory::PoliticalConspiracy,
        r"\b(?:deep\s+state|cabal|illuminati|new\s+world\s+order|nwo)\b",
    ),
    (
        HoaxCategory::PoliticalConspiracy,
        r"\b(?:government|cia|fbi)\b.*\b(?:controlling|control|manipulate)\b.*\b(?:weather|minds|population)\b",
    ),
    (
        HoaxCategory::PoliticalConspiracy,
        r"\b(?:microchip|rfid)\b.*\b(?:implant|track|control)\b.*\b(?:human|people|citizens?)\b",
    ),
];

#[derive(Debug, Clone)]
struct HoaxPattern {
    category: HoaxCategory,
    regex: Regex,
}

/// Fact-check provider over a catalogue of known hoax narratives.
///
/// A match is reported as a `False` rating; no match means the provider has
/// no evidence either way.
#[derive(Debug, Clone)]
pub struct HoaxPatternProvider {
    patterns: Vec<HoaxPattern>,
}

impl HoaxPatternProvider {
    /// Provider with the built-in catalogue.
    pub fn new() -> VerityResult<Self> {
        Self::with_patterns(CATALOGUE.iter().map(|(c, p)| (*c, *p)))
    }

    /// Provider with a custom catalogue. Patterns are case-insensitive and
    /// `.` spans line breaks.
    pub fn with_patterns<'a>(patterns: impl IntoIterator<Item = (HoaxCategory, &'a str)>) -> VerityResult<Self> {
        let patterns = patterns
            .into_iter()
            .map(|(category, pattern)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()
                    .map_err(|e| {
                        VerityError::from(ValidationError::InvalidConfig {
                            reason: format!("invalid hoax pattern '{pattern}': {e}"),
                        })
                    })?;
                Ok(HoaxPattern { category, regex })
            })
            .collect::<VerityResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Categories whose patterns match `text`, with the number of matching
    /// patterns. Empty when nothing matched.
    #[must_use]
    pub fn matches(&self, text: &str) -> Vec<(HoaxCategory, usize)> {
        let mut found: Vec<(HoaxCategory, usize)> = Vec::new();
        for pattern in self.patterns.iter().filter(|p| p.regex.is_match(text)) {
            match found.iter_mut().find(|(c, _)| *c == pattern.category) {
                Some((_, n)) => *n += 1,
                None => found.push((pattern.category, 1)),
            }
        }
        found.sort_by_key(|(c, _)| *c);
        found
    }

    /// Whether any pattern matches.
    #[must_use]
    pub fn is_hoax(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }
}

/// `min(0.5 + 0.15 * (matches - 1), 0.9)`.
fn match_confidence(total_matches: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let extra = total_matches.saturating_sub(1) as f64;
    (BASE_MATCH_CONFIDENCE + PER_EXTRA_MATCH * extra).min(MAX_MATCH_CONFIDENCE)
}

#[async_trait]
impl SignalProvider for HoaxPatternProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> SignalKind {
        SignalKind::FactCheck
    }

    async fn assess(&self, article: &Article) -> VerityResult<ProviderOutput> {
        let found = self.matches(&article.full_text());
        if found.is_empty() {
            debug!("no hoax pattern matched");
            return Err(VerityError::unavailable(PROVIDER_NAME, "no known claim matched"));
        }

        let total: usize = found.iter().map(|(_, n)| n).sum();
        let claim = found
            .iter()
            .map(|(c, _)| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        warn!(categories = %claim, matches = total, "hoax patterns matched");

        Ok(ProviderOutput::FactCheck {
            rating: ClaimRating::False,
            match_confidence: match_confidence(total),
            claim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HoaxPatternProvider {
        HoaxPatternProvider::new().unwrap()
    }

    #[test]
    fn astronomical_hoaxes_detected() {
        let p = provider();
        assert!(p.is_hoax(
            "NASA confirms that Venus and Jupiter will align in November, causing massive power \
             outages across the world. The gravitational pull will affect the sun and cause solar flares."
        ));
        assert!(p.is_hoax(
            "The planetary alignment next month will create a massive energy disruption leading to \
             blackouts worldwide. Governments are hiding this information from the public."
        ));
    }

    #[test]
    fn benign_astronomy_not_flagged() {
        assert!(!provider().is_hoax(
            "Scientists are studying the upcoming conjunction of Venus and Jupiter, which will be \
             visible in the night sky. This is a regular astronomical event with no effect on \
             Earth's power grid."
        ));
    }

    #[test]
    fn health_conspiracy_detected() {
        let found = provider().matches(
            "Whistleblower reveals secret cure for all cancers has been suppressed for decades. \
             The miracle cure is being hidden from the public.",
        );
        assert_eq!(found, vec![(HoaxCategory::HealthConspiracy, 2)]);
    }

    #[test]
    fn confidence_grows_with_matches_and_caps() {
        assert_eq!(match_confidence(1), 0.5);
        assert!((match_confidence(2) - 0.65).abs() < 1e-12);
        assert_eq!(match_confidence(10), 0.9);
    }

    #[test]
    fn invalid_custom_pattern_rejected() {
        let err = HoaxPatternProvider::with_patterns([(HoaxCategory::PoliticalConspiracy, "(unclosed")])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn assess_reports_false_rating() {
        let article = Article::builder()
            .title("NASA Warns of November Blackout Due to Planetary Alignment")
            .text(
                "NASA confirms that a planetary alignment of Venus and Jupiter in November will \
                 cause a nationwide blackout.",
            )
            .source_url("fakenewsmedia.net/nasa-blackout-warning")
            .build()
            .unwrap();
        let out = provider().assess(&article).await.unwrap();
        let ProviderOutput::FactCheck {
            rating,
            match_confidence,
            claim,
        } = out
        else {
            panic!("wrong variant");
        };
        assert_eq!(rating, ClaimRating::False);
        assert_eq!(match_confidence, 0.5);
        assert_eq!(claim, "astronomical_disaster");
    }

    #[tokio::test]
    async fn no_match_is_unavailable() {
        let article = Article::builder()
            .text("The city council approved the new library budget on Tuesday.")
            .source_url("localgazette.com/council")
            .build()
            .unwrap();
        let err = provider().assess(&article).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
