//! Error types for field construction.
//!
//! Everything that can fail happens while a field is being built. Once a field
//! is mounted, its per-frame update path is infallible.

use std::fmt;

/// Errors raised while generating, configuring, or mounting a field.
#[derive(Debug)]
pub enum FieldError {
    /// A field must contain at least one element.
    InvalidCount(usize),
    /// The color palette has no entries.
    EmptyPalette,
    /// A palette entry could not be parsed as a `#rrggbb` hex color.
    InvalidColor(String),
    /// An explicit point list does not have one entry per element.
    PointCountMismatch { expected: usize, actual: usize },
    /// A curve needs at least two distinct anchors.
    TooFewAnchors(usize),
    /// A numeric parameter is non-finite or outside its valid range.
    InvalidParameter { name: &'static str, value: f32 },
    /// Data handed to an instance buffer does not match its capacity.
    CapacityMismatch { capacity: usize, actual: usize },
    /// A field configuration could not be parsed.
    Config(serde_json::Error),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidCount(n) => {
                write!(f, "Invalid element count {}: a field needs at least one element", n)
            }
            FieldError::EmptyPalette => write!(f, "Palette must contain at least one color"),
            FieldError::InvalidColor(s) => write!(f, "Invalid hex color '{}', expected #rrggbb", s),
            FieldError::PointCountMismatch { expected, actual } => write!(
                f,
                "Point list has {} entries but the field has {} elements",
                actual, expected
            ),
            FieldError::TooFewAnchors(n) => write!(
                f,
                "Curve needs at least 2 distinct anchors, got {}",
                n
            ),
            FieldError::InvalidParameter { name, value } => {
                write!(f, "Invalid value {} for parameter '{}'", value, name)
            }
            FieldError::CapacityMismatch { capacity, actual } => write!(
                f,
                "Instance buffer holds {} slots but {} entries were supplied",
                capacity, actual
            ),
            FieldError::Config(e) => write!(f, "Failed to parse field config: {}", e),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        FieldError::Config(e)
    }
}

/// Reject non-finite values and values below `min`.
pub(crate) fn check_at_least(name: &'static str, value: f32, min: f32) -> Result<f32, FieldError> {
    if value.is_finite() && value >= min {
        Ok(value)
    } else {
        Err(FieldError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_values() {
        let err = FieldError::CapacityMismatch { capacity: 75, actual: 74 };
        let msg = err.to_string();
        assert!(msg.contains("75"));
        assert!(msg.contains("74"));
    }

    #[test]
    fn test_check_at_least() {
        assert!(check_at_least("rate", 1.5, 0.0).is_ok());
        assert!(check_at_least("rate", -0.1, 0.0).is_err());
        assert!(check_at_least("rate", f32::NAN, 0.0).is_err());
        assert!(check_at_least("rate", f32::INFINITY, 0.0).is_err());
    }
}
