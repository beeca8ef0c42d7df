//! Grouped-statistic imputation.
//!
//! One shared core drives the four public variants. Fit bins or reads the
//! source column, groups rows where both columns are present, and stores a
//! per-group median or mode keyed by the (source, destination) pair. A pair
//! whose rows never have both values present gets an empty table and fills
//! nothing; an unseen group key at transform time is skipped silently.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::debug;

use crate::binning::{BinSpec, Binner};
use crate::config::{BinningConfig, ColumnPair, validate_pairs};
use crate::error::{ImputeError, Result};
use crate::stats::{first_seen_mode, median, numeric_values, string_values};

/// Group key for one fitted table entry: a bin id for binned numeric
/// sources, or the raw category for categorical sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Bin(u32),
    Category(String),
}

/// Learned per-group statistic.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupStat {
    /// Group median of a numeric destination.
    Number(f64),
    /// Group mode of a categorical destination.
    Category(String),
}

/// Ordered (key, statistic) entries for one column pair: ascending bin id
/// for binned sources, first-seen order for categorical sources.
pub type GroupTable = Vec<(GroupKey, GroupStat)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetStat {
    Median,
    Mode,
}

struct FittedGroups {
    /// One spec per distinct source column; reused verbatim at transform.
    bin_specs: HashMap<String, BinSpec>,
    /// Keyed by (source, destination) so pair identity never collides.
    tables: HashMap<(String, String), GroupTable>,
}

/// Shared fit/transform engine for the four imputer variants.
struct GroupedCore {
    pairs: Vec<ColumnPair>,
    binning: Option<BinningConfig>,
    statistic: TargetStat,
    fitted: Option<FittedGroups>,
}

impl GroupedCore {
    fn new(pairs: Vec<ColumnPair>, binning: Option<BinningConfig>, statistic: TargetStat) -> Self {
        Self {
            pairs,
            binning,
            statistic,
            fitted: None,
        }
    }

    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        for pair in &self.pairs {
            for name in [&pair.source, &pair.destination] {
                if df.column(name).is_err() {
                    return Err(ImputeError::ColumnNotFound(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Per-row group keys for a source column. Binned sources always yield a
    /// key (missing zero-fills before binning); raw categorical sources
    /// yield `None` for missing rows.
    fn source_keys(
        &self,
        df: &DataFrame,
        source: &str,
        bin_specs: &HashMap<String, BinSpec>,
    ) -> Result<Vec<Option<GroupKey>>> {
        let series = df.column(source)?.as_materialized_series();
        match bin_specs.get(source) {
            Some(spec) => Ok(spec
                .assign(series)?
                .into_iter()
                .map(|id| Some(GroupKey::Bin(id)))
                .collect()),
            None => Ok(string_values(series)?
                .into_iter()
                .map(|v| v.map(GroupKey::Category))
                .collect()),
        }
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        validate_pairs(&self.pairs)?;
        self.check_columns(df)?;

        let mut bin_specs = HashMap::new();
        if let Some(binning) = self.binning {
            let binner = Binner::new(binning);
            for pair in &self.pairs {
                if !bin_specs.contains_key(&pair.source) {
                    let series = df.column(&pair.source)?.as_materialized_series();
                    bin_specs.insert(pair.source.clone(), binner.fit(series)?);
                }
            }
        }

        let mut tables = HashMap::new();
        for pair in &self.pairs {
            let keys = self.source_keys(df, &pair.source, &bin_specs)?;
            let destination = df.column(&pair.destination)?.as_materialized_series();

            let table = match self.statistic {
                TargetStat::Median => {
                    let values = numeric_values(destination)?;
                    build_table(&keys, &values, |group| {
                        median(group).map(GroupStat::Number)
                    })
                }
                TargetStat::Mode => {
                    let values = string_values(destination)?;
                    build_table(&keys, &values, |group| {
                        first_seen_mode(group.iter().cloned()).map(GroupStat::Category)
                    })
                }
            };

            debug!(
                source = %pair.source,
                destination = %pair.destination,
                groups = table.len(),
                "fitted group-statistic table"
            );
            tables.insert((pair.source.clone(), pair.destination.clone()), table);
        }

        self.fitted = Some(FittedGroups { bin_specs, tables });
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let fitted = self.fitted.as_ref().ok_or(ImputeError::NotFitted)?;
        self.check_columns(df)?;

        let mut out = df.clone();
        for pair in &self.pairs {
            let key = (pair.source.clone(), pair.destination.clone());
            let Some(table) = fitted.tables.get(&key) else {
                continue;
            };
            if table.is_empty() {
                continue;
            }
            let lookup: HashMap<&GroupKey, &GroupStat> =
                table.iter().map(|(k, s)| (k, s)).collect();

            // Keys and missingness are re-read from the working frame, so a
            // later pair only touches cells still missing after earlier fills.
            let keys = self.source_keys(&out, &pair.source, &fitted.bin_specs)?;
            let destination = out
                .column(&pair.destination)?
                .as_materialized_series()
                .clone();

            let filled = match self.statistic {
                TargetStat::Median => {
                    let mut values = numeric_values(&destination)?;
                    let touched = fill_missing(&mut values, &keys, &lookup, |stat| match stat {
                        GroupStat::Number(v) => Some(*v),
                        GroupStat::Category(_) => None,
                    });
                    touched.then(|| Series::new(pair.destination.as_str().into(), values))
                }
                TargetStat::Mode => {
                    let mut values = string_values(&destination)?;
                    let touched = fill_missing(&mut values, &keys, &lookup, |stat| match stat {
                        GroupStat::Category(v) => Some(v.clone()),
                        GroupStat::Number(_) => None,
                    });
                    touched.then(|| Series::new(pair.destination.as_str().into(), values))
                }
            };

            if let Some(series) = filled {
                debug!(
                    source = %pair.source,
                    destination = %pair.destination,
                    "filled missing values from group statistics"
                );
                out.replace(&pair.destination, series)?;
            }
        }
        Ok(out)
    }

    fn group_table(&self, source: &str, destination: &str) -> Option<&GroupTable> {
        self.fitted
            .as_ref()?
            .tables
            .get(&(source.to_string(), destination.to_string()))
    }
}

/// Group destination values by key, dropping rows where either side is
/// missing, and reduce each group with `stat`. Entry order is first-seen,
/// then sorted ascending for bin keys.
fn build_table<V: Clone>(
    keys: &[Option<GroupKey>],
    values: &[Option<V>],
    stat: impl Fn(&[V]) -> Option<GroupStat>,
) -> GroupTable {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<V>)> = Vec::new();

    for (key, value) in keys.iter().zip(values.iter()) {
        let (Some(key), Some(value)) = (key, value) else {
            continue;
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(value.clone());
    }

    if groups
        .first()
        .is_some_and(|(key, _)| matches!(key, GroupKey::Bin(_)))
    {
        groups.sort_by_key(|(key, _)| match key {
            GroupKey::Bin(id) => *id,
            GroupKey::Category(_) => 0,
        });
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| stat(&members).map(|s| (key, s)))
        .collect()
}

/// Fill still-missing cells whose key has a fitted statistic. Returns true
/// if any cell changed.
fn fill_missing<V>(
    values: &mut [Option<V>],
    keys: &[Option<GroupKey>],
    lookup: &HashMap<&GroupKey, &GroupStat>,
    extract: impl Fn(&GroupStat) -> Option<V>,
) -> bool {
    let mut touched = false;
    for (value, key) in values.iter_mut().zip(keys.iter()) {
        if value.is_some() {
            continue;
        }
        if let Some(key) = key
            && let Some(stat) = lookup.get(key)
            && let Some(fill) = extract(stat)
        {
            *value = Some(fill);
            touched = true;
        }
    }
    touched
}

macro_rules! grouped_imputer_common {
    () => {
        /// Learn the per-group statistics from a dataset.
        pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
            self.core.fit(df)
        }

        /// Fill missing destination values in a new frame; the input is
        /// untouched.
        pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
            self.core.transform(df)
        }

        /// Fit on a dataset and transform it in one call.
        pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
            self.fit(df)?;
            self.transform(df)
        }

        /// The fitted table for one pair, if fit has run.
        pub fn group_table(&self, source: &str, destination: &str) -> Option<&GroupTable> {
            self.core.group_table(source, destination)
        }
    };
}

/// Numeric source (binned) filling a numeric destination with the group
/// median.
pub struct BinnedMedianImputer {
    core: GroupedCore,
}

impl BinnedMedianImputer {
    pub fn new(pairs: Vec<ColumnPair>, binning: BinningConfig) -> Self {
        Self {
            core: GroupedCore::new(pairs, Some(binning), TargetStat::Median),
        }
    }

    grouped_imputer_common!();
}

/// Categorical source (raw) filling a numeric destination with the group
/// median.
pub struct CategoryMedianImputer {
    core: GroupedCore,
}

impl CategoryMedianImputer {
    pub fn new(pairs: Vec<ColumnPair>) -> Self {
        Self {
            core: GroupedCore::new(pairs, None, TargetStat::Median),
        }
    }

    grouped_imputer_common!();
}

/// Categorical source (raw) filling a categorical destination with the
/// group mode.
pub struct CategoryModeImputer {
    core: GroupedCore,
}

impl CategoryModeImputer {
    pub fn new(pairs: Vec<ColumnPair>) -> Self {
        Self {
            core: GroupedCore::new(pairs, None, TargetStat::Mode),
        }
    }

    grouped_imputer_common!();
}

/// Numeric source (binned) filling a categorical destination with the
/// group mode.
pub struct BinnedModeImputer {
    core: GroupedCore,
}

impl BinnedModeImputer {
    pub fn new(pairs: Vec<ColumnPair>, binning: BinningConfig) -> Self {
        Self {
            core: GroupedCore::new(pairs, Some(binning), TargetStat::Mode),
        }
    }

    grouped_imputer_common!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BinningStrategy;

    fn pairs(src: &str, dst: &str) -> Vec<ColumnPair> {
        vec![ColumnPair::new(src, dst)]
    }

    // ========================================================================
    // CategoryMedianImputer
    // ========================================================================

    #[test]
    fn test_category_median_fills_group_median() {
        let df = df![
            "city" => ["a", "a", "a", "b", "b"],
            "age" => [Some(10.0), Some(30.0), None, Some(5.0), None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        let out = imputer.fit_transform(&df).unwrap();

        let age = out.column("age").unwrap();
        assert_eq!(age.null_count(), 0);
        assert_eq!(age.get(2).unwrap().try_extract::<f64>().unwrap(), 20.0);
        assert_eq!(age.get(4).unwrap().try_extract::<f64>().unwrap(), 5.0);
    }

    #[test]
    fn test_category_median_table_order_is_first_seen() {
        let df = df![
            "city" => ["z", "a", "z", "m"],
            "age" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();

        let table = imputer.group_table("city", "age").unwrap();
        let keys: Vec<_> = table.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Category("z".to_string()),
                GroupKey::Category("a".to_string()),
                GroupKey::Category("m".to_string()),
            ]
        );
    }

    #[test]
    fn test_singleton_group_with_missing_destination_stays_missing() {
        // "city_171" case: the only row for that category has a missing
        // destination, so fit learns nothing for the key and transform
        // leaves the cell missing.
        let df = df![
            "city" => ["city_1", "city_1", "city_171"],
            "age" => [Some(20.0), Some(40.0), None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();

        let table = imputer.group_table("city", "age").unwrap();
        assert!(
            !table
                .iter()
                .any(|(k, _)| *k == GroupKey::Category("city_171".to_string()))
        );

        let out = imputer.transform(&df).unwrap();
        assert_eq!(out.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unknown_key_at_transform_is_skipped() {
        let train = df![
            "city" => ["a", "a"],
            "age" => [10.0, 20.0],
        ]
        .unwrap();
        let test = df![
            "city" => ["a", "new_city"],
            "age" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&train).unwrap();
        let out = imputer.transform(&test).unwrap();

        let age = out.column("age").unwrap();
        assert_eq!(age.get(0).unwrap().try_extract::<f64>().unwrap(), 15.0);
        assert!(age.get(1).unwrap().is_null());
    }

    #[test]
    fn test_missing_source_rows_excluded_from_fit() {
        let df = df![
            "city" => [Some("a"), None, Some("a")],
            "age" => [Some(10.0), Some(999.0), Some(20.0)],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();

        let table = imputer.group_table("city", "age").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table[0],
            (
                GroupKey::Category("a".to_string()),
                GroupStat::Number(15.0)
            )
        );
    }

    // ========================================================================
    // BinnedMedianImputer
    // ========================================================================

    #[test]
    fn test_binned_median_fills_from_bin_group() {
        // Two bins over [0, 100]: low values and high values; each missing
        // cell takes the median of its bin.
        let df = df![
            "score" => [Some(0.0), Some(10.0), Some(20.0), Some(90.0), Some(100.0), Some(95.0)],
            "income" => [Some(1.0), Some(3.0), None, Some(100.0), Some(300.0), None],
        ]
        .unwrap();

        let mut imputer = BinnedMedianImputer::new(
            pairs("score", "income"),
            BinningConfig::new(2, BinningStrategy::Uniform),
        );
        let out = imputer.fit_transform(&df).unwrap();

        let income = out.column("income").unwrap();
        assert_eq!(income.null_count(), 0);
        assert_eq!(income.get(2).unwrap().try_extract::<f64>().unwrap(), 2.0);
        assert_eq!(income.get(5).unwrap().try_extract::<f64>().unwrap(), 200.0);
    }

    #[test]
    fn test_binned_table_order_is_ascending_bin_id() {
        let df = df![
            "score" => [90.0, 10.0, 95.0, 5.0],
            "income" => [4.0, 1.0, 6.0, 2.0],
        ]
        .unwrap();

        let mut imputer = BinnedMedianImputer::new(
            pairs("score", "income"),
            BinningConfig::new(2, BinningStrategy::Uniform),
        );
        imputer.fit(&df).unwrap();

        let table = imputer.group_table("score", "income").unwrap();
        let keys: Vec<_> = table.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![GroupKey::Bin(0), GroupKey::Bin(1)]);
    }

    #[test]
    fn test_bin_spec_reused_not_refit_at_transform() {
        let train = df![
            "score" => [0.0, 100.0],
            "income" => [1.0, 9.0],
        ]
        .unwrap();
        // Unseen data with a very different range; bins must come from the
        // fitted [0, 100] spec, so 40.0 still lands in the low bin.
        let test = df![
            "score" => [40.0, 1000.0],
            "income" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let mut imputer = BinnedMedianImputer::new(
            pairs("score", "income"),
            BinningConfig::new(2, BinningStrategy::Uniform),
        );
        imputer.fit(&train).unwrap();
        let out = imputer.transform(&test).unwrap();

        let income = out.column("income").unwrap();
        assert_eq!(income.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(income.get(1).unwrap().try_extract::<f64>().unwrap(), 9.0);
    }

    // ========================================================================
    // CategoryModeImputer / BinnedModeImputer
    // ========================================================================

    #[test]
    fn test_category_mode_fills_most_frequent() {
        let df = df![
            "region" => ["n", "n", "n", "s"],
            "product" => [Some("x"), Some("y"), Some("x"), None],
        ]
        .unwrap();
        let unseen = df![
            "region" => ["n", "s"],
            "product" => [Option::<&str>::None, None],
        ]
        .unwrap();

        let mut imputer = CategoryModeImputer::new(pairs("region", "product"));
        imputer.fit(&df).unwrap();
        let out = imputer.transform(&unseen).unwrap();

        let product = out.column("product").unwrap();
        assert_eq!(product.str().unwrap().get(0), Some("x"));
        // Group "s" had no present destination rows, so no fitted entry.
        assert!(product.get(1).unwrap().is_null());
    }

    #[test]
    fn test_mode_tie_break_is_first_encountered() {
        let df = df![
            "region" => ["n", "n", "n", "n", "n"],
            "product" => [Some("b"), Some("a"), Some("b"), Some("a"), None],
        ]
        .unwrap();

        let mut imputer = CategoryModeImputer::new(pairs("region", "product"));
        let out = imputer.fit_transform(&df).unwrap();

        // "b" and "a" tie at two occurrences; "b" came first.
        assert_eq!(out.column("product").unwrap().str().unwrap().get(4), Some("b"));
    }

    #[test]
    fn test_binned_mode_fills_categorical_from_numeric_bins() {
        let df = df![
            "age" => [Some(10.0), Some(15.0), Some(80.0), Some(85.0), Some(12.0), Some(82.0)],
            "segment" => [Some("young"), Some("young"), Some("old"), Some("old"), None, None],
        ]
        .unwrap();

        let mut imputer = BinnedModeImputer::new(
            pairs("age", "segment"),
            BinningConfig::new(2, BinningStrategy::Uniform),
        );
        let out = imputer.fit_transform(&df).unwrap();

        let segment = out.column("segment").unwrap().str().unwrap().clone();
        assert_eq!(segment.get(4), Some("young"));
        assert_eq!(segment.get(5), Some("old"));
    }

    // ========================================================================
    // Shared contract
    // ========================================================================

    #[test]
    fn test_transform_before_fit_errors() {
        let df = df!["city" => ["a"], "age" => [1.0]].unwrap();
        let imputer = CategoryMedianImputer::new(pairs("city", "age"));
        assert!(matches!(
            imputer.transform(&df),
            Err(ImputeError::NotFitted)
        ));
    }

    #[test]
    fn test_empty_pairs_rejected_at_fit() {
        let df = df!["city" => ["a"], "age" => [1.0]].unwrap();
        let mut imputer = CategoryMedianImputer::new(vec![]);
        assert!(matches!(
            imputer.fit(&df),
            Err(ImputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_column_rejected_at_fit() {
        let df = df!["city" => ["a"], "age" => [1.0]].unwrap();
        let mut imputer = CategoryMedianImputer::new(pairs("city", "salary"));
        assert!(matches!(
            imputer.fit(&df),
            Err(ImputeError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_transform_does_not_mutate_input() {
        let df = df![
            "city" => ["a", "a"],
            "age" => [Some(10.0), None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();
        let _ = imputer.transform(&df).unwrap();

        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let df = df![
            "city" => ["a", "a", "b", "b"],
            "age" => [Some(10.0), None, Some(7.0), None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();
        let once = imputer.transform(&df).unwrap();
        let twice = imputer.transform(&once).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_pairs_sharing_destination_apply_in_declaration_order() {
        // Both pairs target "age"; the first pair's group has a statistic,
        // so the second pair sees the cell already filled and skips it.
        let df = df![
            "city" => ["a", "a", "a"],
            "job" => ["x", "x", "x"],
            "age" => [Some(10.0), Some(20.0), None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(vec![
            ColumnPair::new("city", "age"),
            ColumnPair::new("job", "age"),
        ]);
        imputer.fit(&df).unwrap();
        let out = imputer.transform(&df).unwrap();

        // Filled by the city pair (median 15), not overwritten by job's.
        assert_eq!(
            out.column("age").unwrap().get(2).unwrap().try_extract::<f64>().unwrap(),
            15.0
        );
    }

    #[test]
    fn test_pair_with_no_groups_fills_nothing() {
        let df = df![
            "city" => [Option::<&str>::None, None],
            "age" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let mut imputer = CategoryMedianImputer::new(pairs("city", "age"));
        imputer.fit(&df).unwrap();
        assert!(imputer.group_table("city", "age").unwrap().is_empty());

        let out = imputer.transform(&df).unwrap();
        assert_eq!(out.column("age").unwrap().null_count(), 2);
    }
}
