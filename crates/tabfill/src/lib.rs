//! Tabular Missing-Value Imputation Library
//!
//! Fit/transform imputers and an outlier clipper over polars DataFrames.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Grouped-statistic imputation**: bin or group a source column, learn a
//!   per-group median or mode from the fitted dataset, and fill missing
//!   destination values in unseen data from that lookup table.
//! - **Scalar imputation**: per-column constant/mean/median/mode fills.
//! - **Outlier handling**: per-column bounds from quantiles, literal values,
//!   or IQR fences, with clip or nullify dispositions.
//!
//! Every component follows the same contract: an immutable configuration at
//! construction, `fit` to learn state from a dataset, and `transform` to
//! produce a new frame (the input is never mutated). Fit must precede
//! transform. Cells whose group key has no fitted statistic stay missing;
//! callers inspect remaining null counts.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use polars::prelude::*;
//! use tabfill::{BinningConfig, BinningStrategy, ColumnPair, CategoryMedianImputer};
//!
//! let train = df![
//!     "city" => ["a", "a", "b"],
//!     "age" => [Some(20.0), Some(40.0), Some(31.0)],
//! ]?;
//! let unseen = df![
//!     "city" => ["a", "b"],
//!     "age" => [Option::<f64>::None, None],
//! ]?;
//!
//! let mut imputer = CategoryMedianImputer::new(vec![ColumnPair::new("city", "age")]);
//! imputer.fit(&train)?;
//! let filled = imputer.transform(&unseen)?;
//! assert_eq!(filled.column("age")?.null_count(), 0);
//! ```

pub mod binning;
pub mod config;
pub mod error;
pub mod imputers;
pub mod outliers;
pub mod stats;

// Re-exports for convenient access
pub use binning::{BinSpec, Binner};
pub use config::{
    BinningConfig, BinningStrategy, ColumnPair, FillValue, OutlierDisposition, OutlierStrategy,
    ScalarStrategy,
};
pub use error::{ImputeError, Result as ImputeResult, ResultExt};
pub use imputers::{
    BinnedMedianImputer, BinnedModeImputer, CategoryMedianImputer, CategoryModeImputer, GroupKey,
    GroupStat, GroupTable, ScalarImputer,
};
pub use outliers::{OutlierBounds, OutlierClipper};
