//! Explicit columnar model for date-aligned, multi-series tables.
//!
//! A [`DataTable`] is a strictly ascending Date index plus named value
//! columns of equal length. Merging happens on the Date index under one of
//! the four [`MergeStrategy`] policies; null semantics are explicit
//! (`Option<f64>`, never NaN sentinels).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::series::Series;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column {name} has {got} values for {expected} dates")]
    LengthMismatch {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("Cannot merge zero tables")]
    NothingToMerge,
}

/// Row-matching policy for merging tables on the Date index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Only dates present in every input.
    #[default]
    Inner,
    /// Union of all dates, null-filled.
    Outer,
    /// Dates of the first input.
    Left,
    /// Dates of the last input.
    Right,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::Inner => "inner",
            MergeStrategy::Outer => "outer",
            MergeStrategy::Left => "left",
            MergeStrategy::Right => "right",
        }
    }
}

/// A Date-indexed table of named value columns.
///
/// Invariants: dates strictly ascending; every column exactly
/// `dates.len()` long; column names unique (insertion order preserved).
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    pub dates: Vec<NaiveDate>,
    pub columns: IndexMap<String, Vec<Option<f64>>>,
}

impl DataTable {
    /// Builds a single-column table from a series. Dates keep the series
    /// order, which the gateway has already verified to be ascending.
    pub fn from_series(column: impl Into<String>, series: &Series) -> Self {
        let mut dates = Vec::with_capacity(series.observations.len());
        let mut values = Vec::with_capacity(series.observations.len());
        for obs in &series.observations {
            dates.push(obs.date);
            values.push(obs.value);
        }
        let mut columns = IndexMap::new();
        columns.insert(column.into(), values);
        Self { dates, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Adds a column, enforcing the length and uniqueness invariants.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(TableError::LengthMismatch {
                name,
                got: values.len(),
                expected: self.dates.len(),
            });
        }
        if self.columns.contains_key(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Replaces a column's name and values in place, keeping its position.
    /// Used by the builder when a transformation renames `{id}` to
    /// `{id}_{tag}`.
    pub fn replace_column(
        &mut self,
        old_name: &str,
        new_name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        let new_name = new_name.into();
        if values.len() != self.dates.len() {
            return Err(TableError::LengthMismatch {
                name: new_name,
                got: values.len(),
                expected: self.dates.len(),
            });
        }
        if new_name != old_name && self.columns.contains_key(&new_name) {
            return Err(TableError::DuplicateColumn(new_name));
        }
        let Some(idx) = self.columns.get_index_of(old_name) else {
            return Err(TableError::DuplicateColumn(old_name.to_string()));
        };
        self.columns.shift_remove_index(idx);
        self.columns.shift_insert(idx, new_name, values);
        Ok(())
    }

    /// Merges tables on the Date index under `strategy`.
    ///
    /// The anchor for `left`/`right` is the first/last input. Output dates
    /// are ascending; missing cells are null. Column order follows input
    /// order.
    pub fn merge(tables: Vec<DataTable>, strategy: MergeStrategy) -> Result<DataTable, TableError> {
        if tables.is_empty() {
            return Err(TableError::NothingToMerge);
        }
        if tables.len() == 1 {
            return Ok(tables.into_iter().next().expect("len checked"));
        }

        let index: Vec<NaiveDate> = match strategy {
            MergeStrategy::Inner => {
                let mut iter = tables.iter();
                let mut acc: BTreeSet<NaiveDate> = iter
                    .next()
                    .expect("len checked")
                    .dates
                    .iter()
                    .copied()
                    .collect();
                for t in iter {
                    let other: BTreeSet<NaiveDate> = t.dates.iter().copied().collect();
                    acc = acc.intersection(&other).copied().collect();
                }
                acc.into_iter().collect()
            }
            MergeStrategy::Outer => {
                let mut acc: BTreeSet<NaiveDate> = BTreeSet::new();
                for t in &tables {
                    acc.extend(t.dates.iter().copied());
                }
                acc.into_iter().collect()
            }
            MergeStrategy::Left => tables.first().expect("len checked").dates.clone(),
            MergeStrategy::Right => tables.last().expect("len checked").dates.clone(),
        };

        let mut merged = DataTable {
            dates: index.clone(),
            columns: IndexMap::new(),
        };
        for table in tables {
            for (name, values) in table.columns {
                let mut aligned = Vec::with_capacity(index.len());
                for date in &index {
                    let cell = table
                        .dates
                        .binary_search(date)
                        .ok()
                        .and_then(|i| values.get(i).copied().flatten());
                    aligned.push(cell);
                }
                merged.insert_column(name, aligned)?;
            }
        }
        Ok(merged)
    }

    /// Drops leading and trailing rows where every data column is null.
    /// Interior all-null rows are kept.
    pub fn drop_null_edges(&mut self) {
        let is_all_null = |idx: usize| {
            self.columns
                .values()
                .all(|col| col.get(idx).copied().flatten().is_none())
        };

        let n = self.dates.len();
        let mut start = 0;
        while start < n && is_all_null(start) {
            start += 1;
        }
        let mut end = n;
        while end > start && is_all_null(end - 1) {
            end -= 1;
        }
        if start == 0 && end == n {
            return;
        }
        self.dates = self.dates[start..end].to_vec();
        for col in self.columns.values_mut() {
            *col = col[start..end].to_vec();
        }
    }

    /// Observed window of the table after trimming, if non-empty.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::Observation;
    use crate::models::series::{Frequency, SeriesMeta};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(name: &str, rows: &[(NaiveDate, Option<f64>)]) -> DataTable {
        let series = Series {
            meta: SeriesMeta {
                id: name.to_string(),
                title: String::new(),
                units: String::new(),
                frequency: Frequency::Monthly,
                seasonal_adjustment: String::new(),
                observation_start: None,
                observation_end: None,
                popularity: None,
                notes: None,
            },
            observations: rows
                .iter()
                .map(|(d, v)| Observation::new(*d, *v))
                .collect(),
        };
        DataTable::from_series(name, &series)
    }

    #[test]
    fn inner_merge_keeps_shared_dates_only() {
        let a = table(
            "A",
            &[
                (day(2020, 1, 1), Some(1.0)),
                (day(2020, 2, 1), Some(2.0)),
                (day(2020, 3, 1), Some(3.0)),
            ],
        );
        let b = table(
            "B",
            &[(day(2020, 2, 1), Some(20.0)), (day(2020, 3, 1), Some(30.0))],
        );
        let merged = DataTable::merge(vec![a, b], MergeStrategy::Inner).unwrap();
        assert_eq!(merged.dates, vec![day(2020, 2, 1), day(2020, 3, 1)]);
        assert_eq!(merged.columns["A"], vec![Some(2.0), Some(3.0)]);
        assert_eq!(merged.columns["B"], vec![Some(20.0), Some(30.0)]);
    }

    #[test]
    fn outer_merge_null_fills_the_union() {
        let a = table("A", &[(day(2020, 1, 1), Some(1.0))]);
        let b = table("B", &[(day(2020, 2, 1), Some(2.0))]);
        let merged = DataTable::merge(vec![a, b], MergeStrategy::Outer).unwrap();
        assert_eq!(merged.dates, vec![day(2020, 1, 1), day(2020, 2, 1)]);
        assert_eq!(merged.columns["A"], vec![Some(1.0), None]);
        assert_eq!(merged.columns["B"], vec![None, Some(2.0)]);
    }

    #[test]
    fn left_and_right_anchor_on_first_and_last_input() {
        let a = table(
            "A",
            &[(day(2020, 1, 1), Some(1.0)), (day(2020, 2, 1), Some(2.0))],
        );
        let b = table(
            "B",
            &[(day(2020, 2, 1), Some(20.0)), (day(2020, 3, 1), Some(30.0))],
        );

        let left = DataTable::merge(vec![a.clone(), b.clone()], MergeStrategy::Left).unwrap();
        assert_eq!(left.dates, vec![day(2020, 1, 1), day(2020, 2, 1)]);
        assert_eq!(left.columns["B"], vec![None, Some(20.0)]);

        let right = DataTable::merge(vec![a, b], MergeStrategy::Right).unwrap();
        assert_eq!(right.dates, vec![day(2020, 2, 1), day(2020, 3, 1)]);
        assert_eq!(right.columns["A"], vec![Some(2.0), None]);
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        let a = table("X", &[(day(2020, 1, 1), Some(1.0))]);
        let b = table("X", &[(day(2020, 1, 1), Some(2.0))]);
        assert!(matches!(
            DataTable::merge(vec![a, b], MergeStrategy::Outer),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn empty_inner_intersection_yields_empty_table() {
        let a = table("A", &[(day(2000, 1, 1), Some(1.0))]);
        let b = table("B", &[(day(2020, 1, 1), Some(2.0))]);
        let merged = DataTable::merge(vec![a, b], MergeStrategy::Inner).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn drop_null_edges_trims_but_keeps_interior_gaps() {
        let mut t = table(
            "A",
            &[
                (day(2020, 1, 1), None),
                (day(2020, 2, 1), Some(1.0)),
                (day(2020, 3, 1), None),
                (day(2020, 4, 1), Some(2.0)),
                (day(2020, 5, 1), None),
            ],
        );
        t.drop_null_edges();
        assert_eq!(t.dates, vec![day(2020, 2, 1), day(2020, 3, 1), day(2020, 4, 1)]);
        assert_eq!(t.columns["A"], vec![Some(1.0), None, Some(2.0)]);
    }

    #[test]
    fn replace_column_keeps_position() {
        let a = table(
            "A",
            &[(day(2020, 1, 1), Some(1.0)), (day(2020, 2, 1), Some(2.0))],
        );
        let b = table(
            "B",
            &[(day(2020, 1, 1), Some(3.0)), (day(2020, 2, 1), Some(4.0))],
        );
        let mut merged = DataTable::merge(vec![a, b], MergeStrategy::Inner).unwrap();
        merged
            .replace_column("A", "A_YoY", vec![None, Some(1.0)])
            .unwrap();
        assert_eq!(merged.column_names(), vec!["A_YoY", "B"]);
        assert_eq!(merged.columns["A_YoY"], vec![None, Some(1.0)]);
    }
}
