//! Per-column scalar imputation.
//!
//! Each configured column resolves its strategy to one concrete fill value
//! at fit time; transform substitutes that value for missing cells.
//! Columns outside the configured mapping are never touched.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::{FillValue, ScalarStrategy};
use crate::error::{ImputeError, Result};
use crate::stats::{
    fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, mean, median, numeric_mode,
    sorted_non_null, string_mode,
};

/// Constant/mean/median/mode imputer, independent per column.
pub struct ScalarImputer {
    strategies: Vec<(String, ScalarStrategy)>,
    fitted: Option<HashMap<String, FillValue>>,
}

impl ScalarImputer {
    pub fn new(strategies: Vec<(String, ScalarStrategy)>) -> Self {
        Self {
            strategies,
            fitted: None,
        }
    }

    /// Resolve every configured strategy to a concrete scalar.
    pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut fills = HashMap::new();
        for (column, strategy) in &self.strategies {
            let series = df
                .column(column)
                .map_err(|_| ImputeError::ColumnNotFound(column.clone()))?
                .as_materialized_series();

            let resolved = match strategy {
                ScalarStrategy::Mean => {
                    require_numeric(column, series)?;
                    mean(&sorted_non_null(series)?).map(FillValue::Number)
                }
                ScalarStrategy::Median => {
                    require_numeric(column, series)?;
                    median(&sorted_non_null(series)?).map(FillValue::Number)
                }
                ScalarStrategy::Mode => {
                    if is_numeric_dtype(series.dtype()) {
                        numeric_mode(series)?.map(FillValue::Number)
                    } else {
                        string_mode(series)?.map(FillValue::Text)
                    }
                }
                // Verbatim, no computation.
                ScalarStrategy::Constant(value) => Some(value.clone()),
            };

            match resolved {
                Some(value) => {
                    debug!(column = %column, fill = %value, "resolved scalar fill");
                    fills.insert(column.clone(), value);
                }
                None => {
                    // No non-missing values to learn from; the column keeps
                    // its missing markers at transform.
                    warn!(column = %column, "no values available to resolve strategy");
                }
            }
        }
        self.fitted = Some(fills);
        Ok(())
    }

    /// Substitute resolved scalars for missing cells in a new frame.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let fills = self.fitted.as_ref().ok_or(ImputeError::NotFitted)?;

        let mut out = df.clone();
        for (column, _) in &self.strategies {
            let Some(fill) = fills.get(column) else {
                continue;
            };
            let series = out
                .column(column)
                .map_err(|_| ImputeError::ColumnNotFound(column.clone()))?
                .as_materialized_series()
                .clone();
            if series.null_count() == 0 {
                continue;
            }

            let filled = match fill {
                FillValue::Number(v) if is_numeric_dtype(series.dtype()) => {
                    fill_numeric_nulls(&series, *v)?
                }
                // Type-mismatched constants fall back to string filling.
                FillValue::Number(v) => fill_string_nulls(&series, &v.to_string())?,
                FillValue::Text(s) => fill_string_nulls(&series, s)?,
            };
            out.replace(column, filled)?;
        }
        Ok(out)
    }

    /// Fit on a dataset and transform it in one call.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// The resolved fill value for a column, if fit has run.
    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.fitted.as_ref()?.get(column)
    }
}

fn require_numeric(column: &str, series: &Series) -> Result<()> {
    if is_numeric_dtype(series.dtype()) {
        Ok(())
    } else {
        Err(ImputeError::NotNumeric {
            column: column.to_string(),
            dtype: format!("{}", series.dtype()),
        })
    }
}
