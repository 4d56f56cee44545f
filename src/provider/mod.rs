//! Signal providers.
//!
//! A provider inspects an article and returns one typed [`ProviderOutput`].
//! Providers are independent and run concurrently; any error or timeout is
//! recovered into an absent signal by the engine, so an implementation should
//! simply return `Err` when it has nothing to say.
//!
//! The built-in providers are deterministic, offline heuristics:
//!
//! - [`DomainReputationProvider`]: publisher reputation from the source URL.
//! - [`LexiconSentimentProvider`]: sensationalism and tone from word lists.
//! - [`HoaxPatternProvider`]: known hoax narratives matched by regex.
//!
//! Image authenticity has no built-in provider; plug one in through
//! [`SignalProvider`].

mod hoax;
mod reputation;
mod sentiment;

pub use hoax::{HoaxCategory, HoaxPatternProvider};
pub use reputation::{base_domain, domain_type, extract_host, DomainReputationProvider, DomainType};
pub use sentiment::{Emotion, LexiconSentimentProvider, SentimentReport};

use std::sync::Arc;

use async_trait::async_trait;

use crate::article::Article;
use crate::error::VerityResult;
use crate::normalize::ProviderOutput;
use crate::signal::SignalKind;

/// A source of evidence about an article.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Stable identifier used in logs, signal details and timeout overrides.
    fn name(&self) -> &str;

    /// Kind of signal this provider produces.
    fn kind(&self) -> SignalKind;

    /// Assess an article.
    ///
    /// # Returns
    /// * `Ok(output)` - evidence in the provider's native convention
    /// * `Err(_)` - no evidence (unsupported input, upstream failure...);
    ///   the engine records an absent signal and carries on
    async fn assess(&self, article: &Article) -> VerityResult<ProviderOutput>;
}

/// Rewrites article text before fingerprinting, e.g. translation into the
/// language the providers understand.
#[async_trait]
pub trait TextNormalizer: Send + Sync {
    /// Normalize `text`, optionally knowing its declared language.
    ///
    /// On error the engine falls back to the whitespace-collapsed raw text.
    async fn normalize(&self, text: &str, language: Option<&str>) -> VerityResult<String>;
}

/// The built-in provider set: reputation, sentiment and hoax patterns.
pub fn builtin_providers() -> VerityResult<Vec<Arc<dyn SignalProvider>>> {
    let hoax: Arc<dyn SignalProvider> = Arc::new(HoaxPatternProvider::new()?);
    let reputation: Arc<dyn SignalProvider> = Arc::new(DomainReputationProvider::new()?);
    let sentiment: Arc<dyn SignalProvider> = Arc::new(LexiconSentimentProvider::new());
    Ok(vec![hoax, reputation, sentiment])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_covers_three_kinds() {
        let providers = builtin_providers().unwrap();
        let mut kinds: Vec<SignalKind> = providers.iter().map(|p| p.kind()).collect();
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                SignalKind::FactCheck,
                SignalKind::SourceReputation,
                SignalKind::Sentiment
            ]
        );
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert!(names.contains(&"domain_reputation"));
    }
}
