//! Confidence values.
//!
//! A confidence in Verity is a reliability estimate in `[0.0, 1.0]`:
//! 0 means the evidence should be ignored, 1 means it is fully reliable.
//! It scales how much a signal may move the verdict; it never says which
//! direction the signal points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reliability of a piece of evidence, always inside `[0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use verity::Confidence;
///
/// let conf = Confidence::new(0.9).unwrap();
/// assert_eq!(conf.value(), 0.9);
/// assert!(Confidence::new(1.2).is_err());
///
/// let (clamped, was_clamped) = Confidence::clamped(1.2);
/// assert_eq!(clamped.value(), 1.0);
/// assert!(was_clamped);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Minimum valid confidence value.
    pub const MIN_VALUE: f64 = 0.0;

    /// Maximum valid confidence value.
    pub const MAX_VALUE: f64 = 1.0;

    /// Creates a new confidence with validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ConfidenceOutOfRange` if the value is not in [0.0, 1.0].
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        Self::validate_value(value)?;
        Ok(Self(value))
    }

    /// Clamps an arbitrary value into range.
    ///
    /// Returns the clamped confidence and whether the input had to be changed.
    /// NaN becomes zero.
    #[must_use]
    pub fn clamped(value: f64) -> (Self, bool) {
        if value.is_nan() {
            return (Self::zero(), true);
        }
        let changed = !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value);
        (Self(value.clamp(Self::MIN_VALUE, Self::MAX_VALUE)), changed)
    }

    /// Creates a zero confidence (evidence carries no weight).
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a full confidence.
    #[must_use]
    pub const fn one() -> Self {
        Self(1.0)
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }

    /// Validates that a confidence value is in the valid range.
    fn validate_value(value: f64) -> Result<(), ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        if !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        Ok(())
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Confidence::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_valid_values() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
    }

    #[test]
    fn test_confidence_invalid_values() {
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn test_confidence_clamped() {
        let (c, changed) = Confidence::clamped(0.4);
        assert_eq!(c.value(), 0.4);
        assert!(!changed);

        let (c, changed) = Confidence::clamped(-3.0);
        assert_eq!(c.value(), 0.0);
        assert!(changed);

        let (c, changed) = Confidence::clamped(f64::NAN);
        assert!(c.is_zero());
        assert!(changed);
    }

    #[test]
    fn test_confidence_display() {
        let conf = Confidence::new(0.856).unwrap();
        assert_eq!(format!("{conf}"), "0.86");
    }

    #[test]
    fn test_confidence_deserialization_validates() {
        let ok: Confidence = serde_json::from_str("0.75").unwrap();
        assert_eq!(ok.value(), 0.75);
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
    }
}
