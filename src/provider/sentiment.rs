//! Lexicon-based sentiment and sensationalism.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::article::Article;
use crate::error::{VerityError, VerityResult};
use crate::normalize::ProviderOutput;
use crate::provider::SignalProvider;
use crate::signal::SignalKind;

const PROVIDER_NAME: &str = "lexicon_sentiment";

/// Shorter texts carry no usable sentiment.
const MIN_TEXT_CHARS: usize = 3;

const MIN_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 0.7;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "terrific", "outstanding",
    "superb", "brilliant", "exceptional", "positive", "success", "win", "victory", "breakthrough",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "horrible", "awful", "poor", "disappointing", "catastrophic", "disaster",
    "fail", "failure", "crisis", "problem", "negative", "worst", "corrupt", "false", "fake",
];

const SENSATIONAL_WORDS: &[&str] = &[
    "shocking", "incredible", "unbelievable", "explosive", "bombshell", "secret", "exclusive",
    "breaking", "urgent", "emergency", "disaster", "catastrophe", "crisis", "miracle",
    "revolutionary", "game-changing", "mind-blowing", "devastating", "massive", "horrific", "epic",
];

/// Basic emotions recognised by the lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Anger,
    Fear,
    Joy,
    Sadness,
    Surprise,
}

impl Emotion {
    pub const ALL: [Self; 5] = [Self::Anger, Self::Fear, Self::Joy, Self::Sadness, Self::Surprise];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Surprise => "surprise",
        }
    }

    const fn lexicon(self) -> &'static [&'static str] {
        match self {
            Self::Anger => &["angry", "mad", "furious", "outraged", "rage"],
            Self::Fear => &["afraid", "scared", "frightened", "terrified", "panic"],
            Self::Joy => &["happy", "delighted", "pleased", "joyful", "excited"],
            Self::Sadness => &["sad", "unhappy", "depressed", "miserable", "grief"],
            Self::Surprise => &["surprised", "shocked", "amazed", "astonished", "startled"],
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full lexicon analysis of one text.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentReport {
    /// Whitespace-separated words.
    pub words: usize,
    pub positive: usize,
    pub negative: usize,
    pub sensational: usize,
    /// `(positive - negative) / (positive + negative)`, 0 with no hits.
    pub polarity: f64,
    /// 0 = sober, 1 = maximally sensational.
    pub sensationalism: f64,
    pub confidence: f64,
    pub emotion: Option<Emotion>,
}

/// Sentiment provider backed by small word lists.
#[derive(Debug, Clone)]
pub struct LexiconSentimentProvider {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    sensational: HashSet<&'static str>,
}

impl Default for LexiconSentimentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconSentimentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            sensational: SENSATIONAL_WORDS.iter().copied().collect(),
        }
    }

    /// Analyzes a text. `None` when the text is too short to say anything.
    #[must_use]
    pub fn analyze(&self, text: &str) -> Option<SentimentReport> {
        if text.chars().count() < MIN_TEXT_CHARS {
            return None;
        }
        let raw_words: Vec<&str> = text.split_whitespace().collect();
        if raw_words.is_empty() {
            return None;
        }
        let words = raw_words.len();
        #[allow(clippy::cast_precision_loss)]
        let word_count = words as f64;

        let tokens = tokenize(text);
        let count = |set: &HashSet<&'static str>| tokens.iter().filter(|t| set.contains(t.as_str())).count();
        let positive = count(&self.positive);
        let negative = count(&self.negative);
        let sensational = count(&self.sensational);

        let polarity = if positive + negative == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let p = (positive as f64 - negative as f64) / (positive + negative) as f64;
            p
        };

        #[allow(clippy::cast_precision_loss)]
        let density = |hits: usize, per: f64| (hits as f64 / (word_count / per)).min(1.0);
        let caps = raw_words.iter().filter(|w| is_shouting(w)).count();
        let punctuation = text.chars().filter(|c| matches!(c, '!' | '?')).count();
        let sensationalism =
            ((density(sensational, 10.0) + density(caps, 5.0) + density(punctuation, 5.0)) / 3.0).min(1.0);

        #[allow(clippy::cast_precision_loss)]
        let confidence = ((positive + negative + sensational) as f64 / word_count).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        let emotion = dominant_emotion(&tokens);

        Some(SentimentReport {
            words,
            positive,
            negative,
            sensational,
            polarity,
            sensationalism,
            confidence,
            emotion,
        })
    }
}

/// Lowercase word tokens; hyphenated compounds stay whole.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// An all-caps word longer than three characters.
fn is_shouting(word: &str) -> bool {
    word.chars().count() > 3
        && word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

/// Emotion with the most lexicon hits; earlier emotions win ties.
fn dominant_emotion(tokens: &[String]) -> Option<Emotion> {
    let mut best: Option<(Emotion, usize)> = None;
    for emotion in Emotion::ALL {
        let lexicon = emotion.lexicon();
        let hits = tokens.iter().filter(|t| lexicon.contains(&t.as_str())).count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((emotion, hits));
        }
    }
    best.map(|(e, _)| e)
}

#[async_trait]
impl SignalProvider for LexiconSentimentProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Sentiment
    }

    async fn assess(&self, article: &Article) -> VerityResult<ProviderOutput> {
        let report = self
            .analyze(&article.full_text())
            .ok_or_else(|| VerityError::unavailable(PROVIDER_NAME, "text too short for sentiment analysis"))?;

        debug!(
            words = report.words,
            sensationalism = report.sensationalism,
            polarity = report.polarity,
            "lexicon sentiment"
        );
        Ok(ProviderOutput::Sentiment {
            sensationalism: report.sensationalism,
            polarity: report.polarity,
            confidence: report.confidence,
            emotion: report.emotion.map(|e| e.as_str().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> SentimentReport {
        LexiconSentimentProvider::new().analyze(text).unwrap()
    }

    #[test]
    fn short_text_is_unavailable() {
        let p = LexiconSentimentProvider::new();
        assert!(p.analyze("").is_none());
        assert!(p.analyze("ok").is_none());
        assert!(p.analyze("   ").is_none());
    }

    #[test]
    fn sober_text_scores_low() {
        let r = analyze(
            "A new study published in the journal Nature reports that measured warming \
             over the past fifty years is slightly faster than earlier models estimated.",
        );
        assert_eq!(r.sensational, 0);
        assert!(r.sensationalism < 0.1);
        assert_eq!(r.confidence, MIN_CONFIDENCE);
        assert_eq!(r.polarity, 0.0);
    }

    #[test]
    fn sensational_text_scores_high() {
        let r = analyze("BREAKING: SHOCKING secret miracle cure EXPOSED! They are terrified!!");
        assert!(r.sensational >= 3);
        assert!(r.sensationalism > 0.5);
        assert!(r.confidence <= MAX_CONFIDENCE);
        assert_eq!(r.emotion, Some(Emotion::Fear));
    }

    #[test]
    fn polarity_sign_follows_lexicon() {
        assert!(analyze("a great and wonderful victory").polarity > 0.0);
        assert!(analyze("a terrible corrupt failure").polarity < 0.0);
    }

    #[test]
    fn hyphenated_words_match() {
        let r = analyze("this mind-blowing game-changing result");
        assert_eq!(r.sensational, 2);
    }

    #[test]
    fn shouting_needs_four_letters() {
        assert!(is_shouting("NASA"));
        assert!(is_shouting("EXPOSED:"));
        assert!(!is_shouting("THE"));
        assert!(!is_shouting("1234"));
        assert!(!is_shouting("Nasa"));
    }
}
