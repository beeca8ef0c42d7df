//! Configuration types for the imputation and outlier components.
//!
//! Configuration is user intent only: every component keeps these types
//! immutable and derives its fitted state separately. Strategies are tagged
//! enums carrying exactly the parameters they need, matched exhaustively.

use serde::{Deserialize, Serialize};

use crate::error::{ImputeError, Result};

/// A (source, destination) column pairing for grouped imputation.
///
/// The source column provides the group key; missing values in the
/// destination column are filled from the per-group statistic. Multiple
/// pairs may share a source or a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    /// Column whose values (raw or binned) form the group key.
    pub source: String,
    /// Column whose missing values are filled.
    pub destination: String,
}

impl ColumnPair {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// How bin boundaries are learned from the fitted sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BinningStrategy {
    /// Equal-width intervals spanning [min, max] of the fitted sample.
    #[default]
    Uniform,
    /// Equal-population intervals from the fitted sample's quantiles.
    Quantile,
}

/// Binning configuration for numeric source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Number of bins. Default: 5.
    pub n_bins: usize,
    /// Boundary-learning strategy. Default: uniform.
    pub strategy: BinningStrategy,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            n_bins: 5,
            strategy: BinningStrategy::default(),
        }
    }
}

impl BinningConfig {
    pub fn new(n_bins: usize, strategy: BinningStrategy) -> Self {
        Self { n_bins, strategy }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_bins == 0 {
            return Err(ImputeError::InvalidConfig(
                "n_bins must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A concrete fill value resolved at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    /// Numeric fill.
    Number(f64),
    /// Categorical/text fill.
    Text(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Number(v) => write!(f, "{}", v),
            FillValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Per-column strategy for the scalar imputer.
///
/// Mean and median require a numeric column; mode works on numeric or
/// categorical columns with ties broken by first-encountered order. A
/// constant is substituted verbatim with no computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarStrategy {
    Mean,
    Median,
    Mode,
    Constant(FillValue),
}

/// What happens to a value that falls outside the fitted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierDisposition {
    /// Replace with the violated bound.
    #[default]
    Clip,
    /// Replace with the missing marker.
    #[serde(alias = "na")]
    Nullify,
}

/// Per-column bound computation for the outlier engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierStrategy {
    /// Bounds at the given quantiles of the fitted sample (missing excluded).
    Quantile {
        lower: f64,
        upper: f64,
        disposition: OutlierDisposition,
    },
    /// Literal bounds, no computation.
    Values {
        lower: f64,
        upper: f64,
        disposition: OutlierDisposition,
    },
    /// Tukey fences: q1 - 1.5*IQR and q3 + 1.5*IQR.
    Iqr { disposition: OutlierDisposition },
}

impl OutlierStrategy {
    /// The disposition applied to out-of-bounds values.
    pub fn disposition(&self) -> OutlierDisposition {
        match self {
            OutlierStrategy::Quantile { disposition, .. }
            | OutlierStrategy::Values { disposition, .. }
            | OutlierStrategy::Iqr { disposition } => *disposition,
        }
    }

    /// Validate the strategy parameters.
    pub fn validate(&self, column: &str) -> Result<()> {
        match self {
            OutlierStrategy::Quantile { lower, upper, .. } => {
                if !(0.0..=1.0).contains(lower) || !(0.0..=1.0).contains(upper) {
                    return Err(ImputeError::InvalidConfig(format!(
                        "quantile bounds for '{}' must lie in [0, 1], got [{}, {}]",
                        column, lower, upper
                    )));
                }
                if lower > upper {
                    return Err(ImputeError::InvalidConfig(format!(
                        "lower quantile {} exceeds upper quantile {} for '{}'",
                        lower, upper, column
                    )));
                }
                Ok(())
            }
            OutlierStrategy::Values { lower, upper, .. } => {
                if lower > upper {
                    return Err(ImputeError::InvalidConfig(format!(
                        "lower bound {} exceeds upper bound {} for '{}'",
                        lower, upper, column
                    )));
                }
                Ok(())
            }
            OutlierStrategy::Iqr { .. } => Ok(()),
        }
    }
}

/// Validate a set of column pairs shared by the grouped imputers.
pub(crate) fn validate_pairs(pairs: &[ColumnPair]) -> Result<()> {
    if pairs.is_empty() {
        return Err(ImputeError::InvalidConfig(
            "at least one column pair is required".to_string(),
        ));
    }
    Ok(())
}
