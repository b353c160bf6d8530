//! Layout reconstruction parameters.
//!
//! Every threshold the clusterers use is a multiple of a median height
//! measured on the page itself. The multipliers below are empirically tuned
//! defaults, so they are exposed here instead of being baked in.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Multipliers controlling how tokens are grouped into lines and paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Height of a vertical bucket, relative to the median token height.
    /// Tokens whose tops fall in the same bucket may share a line.
    pub line_tolerance: f64,

    /// Largest horizontal gap that still joins two tokens of a line,
    /// relative to the median token height.
    pub merge_tolerance: f64,

    /// Largest vertical gap between consecutive lines of one paragraph,
    /// relative to the median line height.
    pub paragraph_gap: f64,

    /// Median height used when a page has no box with a positive height.
    pub default_height: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            line_tolerance: 0.25,
            merge_tolerance: 0.3,
            paragraph_gap: 1.5,
            default_height: 1.0,
        }
    }
}

impl LayoutParams {
    /// Bucket height for a page whose median token height is `median_height`.
    pub fn vertical_tolerance(&self, median_height: f64) -> f64 {
        self.line_tolerance * median_height
    }

    /// Horizontal merge slack for a page whose median token height is `median_height`.
    pub fn horizontal_tolerance(&self, median_height: f64) -> f64 {
        self.merge_tolerance * median_height
    }

    /// Paragraph break threshold for a page whose median line height is `median_line_height`.
    pub fn gap_threshold(&self, median_line_height: f64) -> f64 {
        self.paragraph_gap * median_line_height
    }

    /// Check every multiplier is usable.
    ///
    /// `line_tolerance` and `default_height` divide or scale bucket sizes and
    /// must be strictly positive; the other two may be zero (no slack).
    pub fn validate(&self) -> Result<(), LayoutError> {
        fn positive(name: &str, v: f64) -> Result<(), LayoutError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a positive number, got {v}"
                )))
            }
        }
        fn non_negative(name: &str, v: f64) -> Result<(), LayoutError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(LayoutError::InvalidConfig(format!(
                    "{name} must be ≥ 0, got {v}"
                )))
            }
        }
        positive("line_tolerance", self.line_tolerance)?;
        non_negative("merge_tolerance", self.merge_tolerance)?;
        non_negative("paragraph_gap", self.paragraph_gap)?;
        positive("default_height", self.default_height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scale_with_height() {
        let p = LayoutParams::default();
        assert_eq!(p.vertical_tolerance(10.0), 2.5);
        assert_eq!(p.horizontal_tolerance(10.0), 3.0);
        assert_eq!(p.gap_threshold(10.0), 15.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_zero_bucket_height() {
        let p = LayoutParams {
            line_tolerance: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn accepts_zero_slack() {
        let p = LayoutParams {
            merge_tolerance: 0.0,
            paragraph_gap: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_nan() {
        let p = LayoutParams {
            paragraph_gap: f64::NAN,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
