//! Articles and content fingerprints.
//!
//! An `Article` is the transient input of one analysis request. It is
//! fingerprinted once at construction; the fingerprint keys the verdict cache,
//! so any change to the normalized text or the source URL yields a new entry.

use std::fmt;

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

/// Maximum accepted article text length in bytes.
pub const MAX_TEXT_BYTES: usize = 1024 * 1024; // 1 MiB

/// Stable content identifier of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Computes the fingerprint of normalized text and source URL.
    ///
    /// Text is lowercased; the URL is canonicalized by [`canonical_url`].
    #[must_use]
    pub fn compute(normalized_text: &str, source_url: &str) -> Self {
        let mut h = Hasher::new();
        h.update(normalized_text.to_lowercase().as_bytes());
        // Separator keeps ("ab", "c") and ("a", "bc") apart.
        h.update(&[0u8]);
        h.update(canonical_url(source_url).as_bytes());
        Self(*h.finalize().as_bytes())
    }

    /// Builds a fingerprint from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short prefix for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }

    /// Parses a 64-character hex fingerprint.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidConfig {
            reason: format!("'{s}' is not a 64-character hex fingerprint"),
        };
        if s.len() != 64 || !s.is_ascii() {
            return Err(invalid());
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parses a source URL, accepting schemeless input such as `example.com/a`
/// by reading it as `http://`.
///
/// Returns `None` when the input has no host.
#[must_use]
pub fn parse_source_url(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    };
    parsed.ok().filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
}

/// Lowercased host of a parsed URL without a leading `www.` or trailing dot.
pub(crate) fn source_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).trim_end_matches('.');
    (!host.is_empty()).then(|| host.to_string())
}

/// Canonical form of a source URL used for fingerprinting.
///
/// Keeps the lowercased host without `www.`, the path without trailing slashes
/// and the query. Scheme, userinfo, port and fragment are dropped. Input
/// that does not parse as a URL is only trimmed.
#[must_use]
pub fn canonical_url(url: &str) -> String {
    let Some((parsed, host)) = parse_source_url(url).and_then(|u| source_host(&u).map(|h| (u, h))) else {
        return url.trim().to_string();
    };
    let mut out = host;
    out.push_str(parsed.path().trim_end_matches('/'));
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A news article under analysis.
///
/// Immutable once built: the fingerprint is computed from the normalized text
/// and the source URL at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    fingerprint: Fingerprint,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    normalized_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image_urls: Vec<String>,
}

impl Article {
    /// Starts building an article.
    #[must_use]
    pub fn builder() -> ArticleBuilder {
        ArticleBuilder::default()
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Raw text as submitted.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Detected or declared language tag (e.g. `en`).
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Text after translation/normalization; what providers should read.
    #[must_use]
    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    #[must_use]
    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }

    /// Title and normalized text joined, for providers that scan both.
    #[must_use]
    pub fn full_text(&self) -> String {
        match &self.title {
            Some(title) => format!("{title}. {}", self.normalized_text),
            None => self.normalized_text.clone(),
        }
    }
}

/// Builder for [`Article`].
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    text: Option<String>,
    title: Option<String>,
    source_url: Option<String>,
    language: Option<String>,
    normalized_text: Option<String>,
    image_urls: Vec<String>,
}

impl ArticleBuilder {
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Overrides the normalized text (e.g. with a translation).
    #[must_use]
    pub fn normalized_text(mut self, text: impl Into<String>) -> Self {
        self.normalized_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    /// Raw text currently set, if any.
    #[must_use]
    pub fn raw_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Declared language, if any.
    #[must_use]
    pub fn declared_language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Validates inputs and fingerprints the article.
    ///
    /// # Errors
    ///
    /// - `EmptyArticleText` if the text is missing or blank.
    /// - `EmptySourceUrl` if the source URL is missing or blank.
    /// - `FieldTooLong` if the text exceeds [`MAX_TEXT_BYTES`].
    pub fn build(self) -> Result<Article, ValidationError> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::EmptyArticleText)?;
        if text.len() > MAX_TEXT_BYTES {
            return Err(ValidationError::FieldTooLong {
                field: "text".to_string(),
                max_length: MAX_TEXT_BYTES,
            });
        }
        let source_url = self
            .source_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::EmptySourceUrl)?;

        let normalized_text = match self.normalized_text {
            Some(n) if !n.trim().is_empty() => collapse_whitespace(&n),
            _ => collapse_whitespace(&text),
        };
        let fingerprint = Fingerprint::compute(&normalized_text, &source_url);

        Ok(Article {
            fingerprint,
            text,
            title: self.title.filter(|t| !t.trim().is_empty()),
            source_url,
            language: self.language,
            normalized_text,
            image_urls: self.image_urls,
        })
    }
}
