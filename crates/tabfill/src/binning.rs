//! Binning utility for numeric source columns.
//!
//! Boundaries are learned once at fit time and reused verbatim afterwards;
//! a spec is never refit. Missing values are zero-filled before binning at
//! both fit and transform, identically.

use tracing::debug;

use crate::config::{BinningConfig, BinningStrategy};
use crate::error::Result;
use crate::stats::{quantile_sorted, zero_filled};
use polars::prelude::*;

/// Learns bin boundaries for a numeric column.
pub struct Binner {
    config: BinningConfig,
}

/// Fitted bin boundaries: `n_bins + 1` ascending edges.
///
/// Bin `i` covers `[edges[i], edges[i+1])`, with the last bin closed on the
/// right. Values outside the fitted range clamp into the first/last bin. A
/// collapsed range (all fitted values identical, or an empty sample) maps
/// every value to bin 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSpec {
    edges: Vec<f64>,
}

impl Binner {
    pub fn new(config: BinningConfig) -> Self {
        Self { config }
    }

    /// Learn bin boundaries from the fitted sample.
    pub fn fit(&self, series: &Series) -> Result<BinSpec> {
        self.config.validate()?;
        let mut values = zero_filled(series)?;

        let n_bins = self.config.n_bins;
        let edges = if values.is_empty() {
            vec![0.0; n_bins + 1]
        } else {
            match self.config.strategy {
                BinningStrategy::Uniform => {
                    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let width = (max - min) / n_bins as f64;
                    (0..=n_bins)
                        .map(|i| {
                            if i == n_bins {
                                max
                            } else {
                                min + i as f64 * width
                            }
                        })
                        .collect()
                }
                BinningStrategy::Quantile => {
                    values.sort_by(|a, b| a.total_cmp(b));
                    (0..=n_bins)
                        .map(|i| {
                            let q = i as f64 / n_bins as f64;
                            // Sample is non-empty here.
                            quantile_sorted(&values, q).unwrap_or(0.0)
                        })
                        .collect()
                }
            }
        };

        debug!(
            column = %series.name(),
            n_bins,
            strategy = ?self.config.strategy,
            "fitted bin boundaries"
        );
        Ok(BinSpec { edges })
    }
}

impl BinSpec {
    /// Number of bins this spec produces ids for.
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// The fitted edges, ascending.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Map each row of a series to its bin id, zero-filling missing values
    /// first.
    pub fn assign(&self, series: &Series) -> Result<Vec<u32>> {
        let values = zero_filled(series)?;
        Ok(values.iter().map(|v| self.bin_of(*v)).collect())
    }

    fn bin_of(&self, value: f64) -> u32 {
        let last = self.edges.len() - 1;
        if self.edges[0] == self.edges[last] {
            // Collapsed range: everything lands in bin 0.
            return 0;
        }
        let interior = &self.edges[1..last];
        interior.partition_point(|edge| *edge <= value) as u32
    }
}
