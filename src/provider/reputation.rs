//! Publisher reputation from the source URL.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::article::{parse_source_url, source_host, Article};
use crate::error::{ValidationError, VerityError, VerityResult};
use crate::normalize::ProviderOutput;
use crate::provider::SignalProvider;
use crate::signal::SignalKind;

const PROVIDER_NAME: &str = "domain_reputation";

/// Confidence attached to a table hit.
const KNOWN_CONFIDENCE: f64 = 0.9;
/// Confidence attached to a heuristic estimate.
const HEURISTIC_CONFIDENCE: f64 = 0.4;

/// Unknown domains never score outside this range.
const HEURISTIC_FLOOR: f64 = 0.1;
const HEURISTIC_CEILING: f64 = 0.7;

const CREDIBLE_SOURCES: &[(&str, f64)] = &[
    ("reuters.com", 0.95),
    ("apnews.com", 0.95),
    ("bbc.com", 0.9),
    ("bbc.co.uk", 0.9),
    ("nytimes.com", 0.85),
    ("washingtonpost.com", 0.85),
    ("theguardian.com", 0.85),
    ("npr.org", 0.85),
    ("bloomberg.com", 0.8),
    ("economist.com", 0.85),
    ("wsj.com", 0.8),
    ("cnn.com", 0.75),
    ("abcnews.go.com", 0.8),
    ("nbcnews.com", 0.75),
    ("thehill.com", 0.7),
    ("politico.com", 0.75),
    ("time.com", 0.8),
    ("nature.com", 0.95),
    ("science.org", 0.95),
    ("sciencemag.org", 0.95),
    ("newscientist.com", 0.85),
    ("scientificamerican.com", 0.9),
    ("smithsonianmag.com", 0.85),
    ("nationalgeographic.com", 0.85),
    ("popsci.com", 0.7),
    ("snopes.com", 0.85),
    ("factcheck.org", 0.85),
    ("politifact.com", 0.85),
];

const UNRELIABLE_SOURCES: &[(&str, f64)] = &[
    ("infowars.com", 0.1),
    ("naturalnews.com", 0.15),
    ("breitbart.com", 0.2),
    ("dailycaller.com", 0.3),
    ("zerohedge.com", 0.2),
    ("sputniknews.com", 0.25),
    ("rt.com", 0.3),
    ("beforeitsnews.com", 0.1),
    ("newsmax.com", 0.4),
    ("americanthinker.com", 0.3),
    ("thegatewaypundit.com", 0.2),
    ("activistpost.com", 0.2),
    ("worldtruth.tv", 0.1),
    ("wnd.com", 0.3),
];

const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "truth", "real", "exposed", "uncensored", "patriot", "freedom", "alternative", "conspiracy",
    "insider", "breaking", "viral", "secret", "shocking", "illuminati", "globalist", "wake",
    "awakening", "truther", "planet", "fake", "hoax", "lie", "truenews", "realnews",
];

const SUSPICIOUS_TLDS: &[&str] = &[
    ".info", ".xyz", ".top", ".biz", ".club", ".site", ".online", ".pro", ".network", ".ws", ".pw",
];

const FAKE_DOMAIN_PATTERNS: &[&str] = &[
    r"\w+truth\.(?:com|org|net|info)",
    r"real\w+news\.(?:com|org|net|info)",
    r"\w+exposed\.(?:com|org|net|info)",
    r"\w+uncensored\.(?:com|org|net|info)",
    r"\w+leaks\.(?:com|org|net|info)",
    r"\w+conspiracy\.(?:com|org|net|info)",
    r"the\w+awakening\.(?:com|org|net|info)",
    r"\w+patriot\w+\.(?:com|org|net|info)",
    r"\w+freedom\w+\.(?:com|org|net|info)",
    r"\w+truther\w+\.(?:com|org|net|info)",
    r"fakenews\w+\.(?:com|org|net|info)",
    r"\w+fakemedia\.(?:com|org|net|info)",
];

/// Second-level labels that form a public suffix with a country code
/// (`co.uk`, `com.au`...).
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "gov", "edu"];
const SECOND_LEVEL_COUNTRIES: &[&str] = &["uk", "au", "nz", "jp"];

const FACT_CHECKERS: &[&str] = &["snopes", "factcheck", "politifact"];
const MAINSTREAM_NEWS: &[&str] = &["cnn", "bbc", "nytimes", "washingtonpost", "reuters", "ap"];

/// Broad class of a publishing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainType {
    /// `.gov`, `.edu`, `.mil`.
    Official,
    FactChecker,
    /// Other `.org` domains.
    Organization,
    MainstreamNews,
    /// Other `.com` / `.net` domains.
    Commercial,
    /// Suspicious top-level domain.
    Suspicious,
    Other,
}

impl DomainType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::FactChecker => "fact_checker",
            Self::Organization => "organization",
            Self::MainstreamNews => "mainstream_news",
            Self::Commercial => "commercial",
            Self::Suspicious => "suspicious",
            Self::Other => "other",
        }
    }

    /// Credibility prior for the class.
    #[must_use]
    pub const fn prior_credibility(&self) -> f64 {
        match self {
            Self::Official | Self::FactChecker => 0.9,
            Self::MainstreamNews => 0.85,
            Self::Organization => 0.7,
            Self::Commercial | Self::Other => 0.5,
            Self::Suspicious => 0.3,
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased host of a URL with any `www.` prefix removed.
///
/// Accepts schemeless URLs (`example.com/path`). Returns `None` unless the
/// host is a dotted DNS name.
#[must_use]
pub fn extract_host(url: &str) -> Option<String> {
    let host = source_host(&parse_source_url(url)?)?;
    let valid = host.contains('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && host.split('.').all(|label| !label.is_empty());
    valid.then_some(host)
}

/// Registrable domain of a host: the last two labels, or the last three for
/// country second-level suffixes such as `co.uk`.
#[must_use]
pub fn base_domain(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    let n = parts.len();
    if n <= 2 {
        return host.to_string();
    }
    let country_suffix = SECOND_LEVEL_LABELS.contains(&parts[n - 2])
        && SECOND_LEVEL_COUNTRIES.contains(&parts[n - 1]);
    if country_suffix {
        parts[n - 3..].join(".")
    } else {
        parts[n - 2..].join(".")
    }
}

/// Splits a registrable domain into its name label and public suffix.
fn split_name_suffix(base: &str) -> (&str, &str) {
    base.split_once('.').unwrap_or((base, ""))
}

/// Classifies the domain of a URL. `None` if the URL has no usable host.
#[must_use]
pub fn domain_type(url: &str) -> Option<DomainType> {
    let host = extract_host(url)?;
    let base = base_domain(&host);
    let (name, suffix) = split_name_suffix(&base);
    let tld = format!(".{suffix}");

    let kind = match suffix {
        "gov" | "edu" | "mil" => DomainType::Official,
        "org" if FACT_CHECKERS.contains(&name) => DomainType::FactChecker,
        "org" => DomainType::Organization,
        "com" | "net" if MAINSTREAM_NEWS.contains(&name) => DomainType::MainstreamNews,
        "com" | "net" => DomainType::Commercial,
        _ if SUSPICIOUS_TLDS.contains(&tld.as_str()) => DomainType::Suspicious,
        _ => DomainType::Other,
    };
    Some(kind)
}

/// Source reputation from curated tables, falling back to domain-name
/// heuristics for unknown publishers.
#[derive(Debug, Clone)]
pub struct DomainReputationProvider {
    known: HashMap<String, f64>,
    fake_patterns: Vec<Regex>,
}

impl DomainReputationProvider {
    /// Provider with the built-in tables.
    pub fn new() -> VerityResult<Self> {
        let known = CREDIBLE_SOURCES
            .iter()
            .chain(UNRELIABLE_SOURCES)
            .map(|(domain, score)| ((*domain).to_string(), *score))
            .collect();

        let fake_patterns = FAKE_DOMAIN_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    VerityError::from(ValidationError::InvalidConfig {
                        reason: format!("invalid domain pattern '{p}': {e}"),
                    })
                })
            })
            .collect::<VerityResult<Vec<_>>>()?;

        Ok(Self {
            known,
            fake_patterns,
        })
    }

    /// Adds or overrides a known source.
    #[must_use]
    pub fn with_known_source(mut self, domain: &str, credibility: f64) -> Self {
        self.known
            .insert(domain.trim().to_ascii_lowercase(), credibility.clamp(0.0, 1.0));
        self
    }

    /// Evaluates a URL.
    ///
    /// Returns `ProviderUnavailable` when no host can be extracted.
    pub fn evaluate(&self, url: &str) -> VerityResult<ProviderOutput> {
        let host = extract_host(url)
            .ok_or_else(|| VerityError::unavailable(PROVIDER_NAME, format!("unparseable url '{url}'")))?;
        let base = base_domain(&host);

        if let Some(&credibility) = self.known.get(&host).or_else(|| self.known.get(&base)) {
            let category = if credibility >= 0.5 {
                "known_credible"
            } else {
                "known_unreliable"
            };
            debug!(host = %host, credibility, category, "known source");
            return Ok(ProviderOutput::SourceReputation {
                credibility,
                confidence: KNOWN_CONFIDENCE,
                category: category.to_string(),
            });
        }

        let credibility = self.heuristic_score(&host, &base);
        let class = domain_type(url).unwrap_or(DomainType::Other);
        debug!(host = %host, credibility, domain_type = %class, "heuristic source score");
        Ok(ProviderOutput::SourceReputation {
            credibility,
            confidence: HEURISTIC_CONFIDENCE,
            category: format!("heuristic:{class}"),
        })
    }

    fn heuristic_score(&self, host: &str, base: &str) -> f64 {
        let mut score: f64 = 0.5;

        if SUSPICIOUS_KEYWORDS.iter().any(|k| base.contains(k)) {
            score -= 0.1;
        }
        if SUSPICIOUS_TLDS.iter().any(|tld| base.ends_with(tld)) {
            score -= 0.1;
        }
        if self.fake_patterns.iter().any(|re| re.is_match(base)) {
            score -= 0.2;
        }

        let subdomain = host
            .strip_suffix(base)
            .map(|s| s.trim_end_matches('.'))
            .unwrap_or_default();
        if !subdomain.is_empty() && SUSPICIOUS_KEYWORDS.iter().any(|k| subdomain.contains(k)) {
            score -= 0.05;
        }

        if base.contains("fake") || base.contains("hoax") {
            score = HEURISTIC_FLOOR;
        }

        score.clamp(HEURISTIC_FLOOR, HEURISTIC_CEILING)
    }
}

#[async_trait]
impl SignalProvider for DomainReputationProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> SignalKind {
        SignalKind::SourceReputation
    }

    async fn assess(&self, article: &Article) -> VerityResult<ProviderOutput> {
        self.evaluate(article.source_url())
    }
}
