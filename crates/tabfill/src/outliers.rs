//! Outlier bound computation and treatment.
//!
//! Fit learns a (lower, upper) bound per configured column from quantiles,
//! literal values, or Tukey's IQR fences. Transform replaces values strictly
//! outside the bounds with the violated bound (clip) or with the missing
//! marker (nullify); in-bounds values and existing nulls are untouched.
//! Columns are independent, so processing order never matters.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::{OutlierDisposition, OutlierStrategy};
use crate::error::{ImputeError, Result};
use crate::stats::{is_numeric_dtype, numeric_values, quantile_sorted, sorted_non_null};

/// Learned bounds for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
    pub disposition: OutlierDisposition,
}

/// Clips or nulls out values outside per-column fitted bounds.
pub struct OutlierClipper {
    strategies: Vec<(String, OutlierStrategy)>,
    fitted: Option<HashMap<String, OutlierBounds>>,
}

impl OutlierClipper {
    pub fn new(strategies: Vec<(String, OutlierStrategy)>) -> Self {
        Self {
            strategies,
            fitted: None,
        }
    }

    /// Compute bounds for every configured column.
    pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut bounds = HashMap::new();
        for (column, strategy) in &self.strategies {
            strategy.validate(column)?;
            let series = df
                .column(column)
                .map_err(|_| ImputeError::ColumnNotFound(column.clone()))?
                .as_materialized_series();
            if !is_numeric_dtype(series.dtype()) {
                return Err(ImputeError::NotNumeric {
                    column: column.clone(),
                    dtype: format!("{}", series.dtype()),
                });
            }

            let resolved = match strategy {
                OutlierStrategy::Values {
                    lower,
                    upper,
                    disposition,
                } => Some(OutlierBounds {
                    lower: *lower,
                    upper: *upper,
                    disposition: *disposition,
                }),
                OutlierStrategy::Quantile {
                    lower,
                    upper,
                    disposition,
                } => {
                    let sorted = sorted_non_null(series)?;
                    match (
                        quantile_sorted(&sorted, *lower),
                        quantile_sorted(&sorted, *upper),
                    ) {
                        (Some(lo), Some(hi)) => Some(OutlierBounds {
                            lower: lo,
                            upper: hi,
                            disposition: *disposition,
                        }),
                        _ => None,
                    }
                }
                OutlierStrategy::Iqr { disposition } => {
                    let sorted = sorted_non_null(series)?;
                    match (
                        quantile_sorted(&sorted, 0.25),
                        quantile_sorted(&sorted, 0.75),
                    ) {
                        (Some(q1), Some(q3)) => {
                            let iqr = q3 - q1;
                            Some(OutlierBounds {
                                lower: q1 - 1.5 * iqr,
                                upper: q3 + 1.5 * iqr,
                                disposition: *disposition,
                            })
                        }
                        _ => None,
                    }
                }
            };

            match resolved {
                Some(b) => {
                    debug!(
                        column = %column,
                        lower = b.lower,
                        upper = b.upper,
                        "fitted outlier bounds"
                    );
                    bounds.insert(column.clone(), b);
                }
                None => {
                    warn!(column = %column, "no values available to compute bounds");
                }
            }
        }
        self.fitted = Some(bounds);
        Ok(())
    }

    /// Apply the fitted bounds to a new frame; the input is untouched.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let fitted = self.fitted.as_ref().ok_or(ImputeError::NotFitted)?;

        let mut out = df.clone();
        for (column, _) in &self.strategies {
            let Some(bounds) = fitted.get(column) else {
                continue;
            };
            let series = out
                .column(column)
                .map_err(|_| ImputeError::ColumnNotFound(column.clone()))?
                .as_materialized_series()
                .clone();

            let treated: Vec<Option<f64>> = numeric_values(&series)?
                .into_iter()
                .map(|v| match v {
                    Some(v) if v < bounds.lower => match bounds.disposition {
                        OutlierDisposition::Clip => Some(bounds.lower),
                        OutlierDisposition::Nullify => None,
                    },
                    Some(v) if v > bounds.upper => match bounds.disposition {
                        OutlierDisposition::Clip => Some(bounds.upper),
                        OutlierDisposition::Nullify => None,
                    },
                    other => other,
                })
                .collect();

            out.replace(column, Series::new(column.as_str().into(), treated))?;
        }
        Ok(out)
    }

    /// Fit on a dataset and transform it in one call.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// The fitted bounds for a column, if fit has run.
    pub fn bounds(&self, column: &str) -> Option<&OutlierBounds> {
        self.fitted.as_ref()?.get(column)
    }
}
