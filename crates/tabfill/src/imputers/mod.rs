//! Imputation components for handling missing values.
//!
//! This module provides:
//! - Grouped-statistic imputation (four source/destination variants)
//! - Scalar imputation (constant, mean, median, mode)

mod grouped;
mod scalar;

pub use grouped::{
    BinnedMedianImputer, BinnedModeImputer, CategoryMedianImputer, CategoryModeImputer, GroupKey,
    GroupStat, GroupTable,
};
pub use scalar::ScalarImputer;
