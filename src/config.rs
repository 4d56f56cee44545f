//! Engine configuration.
//!
//! One [`VerityConfig`] holds every tunable: aggregation weights and
//! thresholds, cache sizing, provider timeouts and score mappings. Every
//! section and field has a default, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! [aggregation]
//! min_confidence_threshold = 0.3
//!
//! [aggregation.weights]
//! fact_check = 0.5
//!
//! [cache]
//! capacity = 4096
//! ttl_secs = 600
//!
//! [providers]
//! timeout_ms = 2000
//! analysis_deadline_ms = 8000
//!
//! [providers.timeouts_ms]
//! domain_reputation = 500
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::AggregationConfig;
use crate::cache::CacheConfig;
use crate::error::ValidationError;
use crate::normalize::NormalizerConfig;

/// Provider scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Default per-provider timeout in milliseconds.
    pub timeout_ms: u64,

    /// Per-provider overrides, keyed by provider name.
    pub timeouts_ms: BTreeMap<String, u64>,

    /// Upper bound on collecting all provider results, in milliseconds.
    pub analysis_deadline_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            timeouts_ms: BTreeMap::new(),
            analysis_deadline_ms: 15_000,
        }
    }
}

impl ProviderConfig {
    /// Timeout for a named provider.
    #[must_use]
    pub fn timeout_for(&self, provider: &str) -> Duration {
        let ms = self.timeouts_ms.get(provider).copied().unwrap_or(self.timeout_ms);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub const fn analysis_deadline(&self) -> Duration {
        Duration::from_millis(self.analysis_deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "providers.timeout_ms must be positive".to_string(),
            });
        }
        if let Some((name, _)) = self.timeouts_ms.iter().find(|(_, ms)| **ms == 0) {
            return Err(ValidationError::InvalidConfig {
                reason: format!("providers.timeouts_ms.{name} must be positive"),
            });
        }
        if self.analysis_deadline_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "providers.analysis_deadline_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerityConfig {
    pub aggregation: AggregationConfig,
    pub cache: CacheConfig,
    pub providers: ProviderConfig,
    pub normalizer: NormalizerConfig,
}

impl VerityConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ValidationError> {
        let config: Self = toml::from_str(source).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("failed to parse TOML: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("failed to read config file {}: {e}", path.display()),
        })?;
        let config = Self::from_toml_str(&source)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> Result<String, ValidationError> {
        toml::to_string_pretty(self).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("failed to serialize TOML: {e}"),
        })
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.aggregation.validate()?;
        self.cache.validate()?;
        self.providers.validate()?;
        self.normalizer.validate()?;
        Ok(())
    }
}
