//! Shared series and statistics helpers.
//!
//! Quantiles use linear interpolation over the sorted non-missing sample, and
//! mode breaks frequency ties by first-encountered order, which is part of
//! the fitted-table contract.

use std::collections::HashMap;
use std::hash::Hash;

use polars::prelude::*;

use crate::error::Result;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Extract a series as `Option<f64>` per row.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Extract a series as `Option<String>` per row, rendering non-string
/// columns through polars' string cast.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Collect the non-missing values of a numeric series in ascending order.
pub fn sorted_non_null(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    let mut values: Vec<f64> = cast.f64()?.into_iter().flatten().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Linear-interpolation quantile over an ascending-sorted sample.
///
/// Returns `None` for an empty sample. `q` is clamped to [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        let frac = pos - lo as f64;
        Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
    }
}

/// Median of a sample; even-sized samples average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, 0.5)
}

/// Mean over a sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent value; ties broken by first-encountered order.
pub fn first_seen_mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order: Vec<T> = Vec::new();
    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    // Strict comparison keeps the earliest value on ties.
    let mut best: Option<(T, usize)> = None;
    for value in order {
        let count = counts[&value];
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Mode of a string series over non-missing values.
pub fn string_mode(series: &Series) -> Result<Option<String>> {
    let values = string_values(series)?;
    Ok(first_seen_mode(values.into_iter().flatten()))
}

/// Mode of a numeric series over non-missing values.
pub fn numeric_mode(series: &Series) -> Result<Option<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    let bits = cast.f64()?.into_iter().flatten().map(f64::to_bits);
    Ok(first_seen_mode(bits).map(f64::from_bits))
}

/// Fill null values in a numeric series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> Result<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string series with a specific value.
///
/// Non-string columns are rendered through the string cast first.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> Result<Series> {
    let cast = series.cast(&DataType::String)?;
    let filled: Vec<String> = cast
        .str()?
        .into_iter()
        .map(|v| match v {
            Some(s) => s.to_string(),
            None => fill_value.to_string(),
        })
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Numeric view of a series with missing values replaced by zero.
///
/// This is the zero-fill the binning utility applies identically at fit and
/// transform; it is a caller-visible approximation, not imputation.
pub fn zero_filled(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}
