//! Row and column verbs: filter, mutate, select, rename, arrange,
//! summarise and count
//!
//! Every verb borrows its input and returns a new DataFrame.

use std::cmp::Ordering;

use log::trace;

use crate::column::Value;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::expr::{Evaluator, Expr};
use crate::groupby::{summarise_partitions, Partition};

/// Sort key for `arrange`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl DataFrame {
    /// Keep rows where every predicate is true
    ///
    /// Predicates are AND-combined with three-valued logic; rows where the
    /// result is false or missing are dropped. Row order is preserved.
    pub fn filter<I>(&self, predicates: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = Expr>,
    {
        let predicates: Vec<Expr> = predicates.into_iter().collect();
        let mask = Evaluator::new(self).evaluate_predicates(&predicates)?;

        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_true())
            .map(|(i, _)| i)
            .collect();

        trace!("filter kept {} of {} rows", keep.len(), self.row_count());
        self.take_rows(&keep)
    }

    /// Add or replace columns
    ///
    /// Expressions run left to right and each one sees the columns produced
    /// before it. An existing name is replaced in place; a new name is
    /// appended.
    pub fn mutate<I, S>(&self, exprs: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        let mut result = self.clone();
        for (name, expr) in exprs {
            let column = Evaluator::new(&result).evaluate_column(&expr)?;
            result = result.with_column(name, column)?;
        }
        Ok(result)
    }

    /// Keep the listed columns, in the listed order
    pub fn select<I, S>(&self, columns: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = DataFrame::new();
        for name in columns {
            let name = name.as_ref();
            let column = self.column(name)?.clone();
            result.add_column(name, column)?;
        }
        Ok(result)
    }

    /// Rename columns; positions and data are unchanged
    pub fn rename<I, S, T>(&self, renames: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: Into<String>,
    {
        let mut result = self.clone();
        for (old_name, new_name) in renames {
            let old_name = old_name.as_ref();
            let new_name = new_name.into();

            if result.column_indices.contains_key(&new_name) && old_name != new_name {
                return Err(Error::DuplicateColumnName(new_name));
            }

            let idx = result
                .column_indices
                .remove(old_name)
                .ok_or_else(|| Error::ColumnNotFound(old_name.to_string()))?;
            result.column_indices.insert(new_name.clone(), idx);
            result.column_names[idx] = new_name;
        }
        Ok(result)
    }

    /// Stable sort by one or more keys
    ///
    /// Missing values sort last in both directions. Factors sort by level
    /// position.
    pub fn arrange<I, K>(&self, keys: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = K>,
        K: Into<SortKey>,
    {
        let keys: Vec<SortKey> = keys.into_iter().map(Into::into).collect();
        let mut sort_columns: Vec<(Vec<Value>, bool)> = Vec::with_capacity(keys.len());
        for key in &keys {
            sort_columns.push((self.column(&key.column)?.values(), key.descending));
        }

        let mut indices: Vec<usize> = (0..self.row_count()).collect();
        indices.sort_by(|&i, &j| {
            for (values, descending) in &sort_columns {
                let (a, b) = (&values[i], &values[j]);
                let ordering = match (a.is_null(), b.is_null()) {
                    (false, false) if *descending => b.sort_cmp(a),
                    _ => a.sort_cmp(b),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        self.take_rows(&indices)
    }

    /// Reduce the whole DataFrame to one row
    ///
    /// Each expression must produce one value (an aggregate, a literal, or
    /// arithmetic over those).
    pub fn summarise<I, S>(&self, aggregations: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        let aggregations: Vec<(String, Expr)> = aggregations
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .collect();
        let everything = [Partition {
            key: Vec::new(),
            rows: (0..self.row_count()).collect(),
        }];
        summarise_partitions(self, &[], &everything, &aggregations)
    }

    /// Row count per distinct combination of `keys`, as column `n`
    pub fn count<I, S>(&self, keys: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_by(keys)?.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{CategoricalColumn, Float64Column, Int64Column};
    use crate::expr::{col, lit, mean, n};

    fn points() -> DataFrame {
        DataFrame::from_columns([
            ("x", Int64Column::new(vec![0, 3, 4])),
            ("y", Int64Column::new(vec![5, 3, 0])),
        ])
        .unwrap()
    }

    #[test]
    fn filter_keeps_definitely_true_rows() {
        let df = points();
        let out = df
            .filter([col("x").gt(lit(0)), col("y").gt(lit(0))])
            .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.row(0).unwrap(), vec![Value::Int64(3), Value::Int64(3)]);
        // input untouched
        assert_eq!(df.row_count(), 3);
    }

    #[test]
    fn filter_drops_missing() {
        let mut df = DataFrame::new();
        df.add_column("v", Float64Column::from_options(vec![Some(1.0), None, Some(3.0)]))
            .unwrap();
        let out = df.filter([col("v").gt(lit(0))]).unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn mutate_sees_earlier_columns() {
        let df = DataFrame::from_columns([
            ("x", Int64Column::new(vec![2, 5])),
            ("y", Int64Column::new(vec![4, 5])),
        ])
        .unwrap();
        let out = df
            .mutate([
                ("size", (col("x") + col("y")) / lit(2)),
                ("double", col("size") * lit(2)),
                ("x", lit("replaced")),
            ])
            .unwrap();
        assert_eq!(out.column_names(), &["x", "y", "size", "double"]);
        assert_eq!(
            out.column("size").unwrap().values(),
            vec![Value::Float64(3.0), Value::Float64(5.0)]
        );
        assert_eq!(out.value(1, "double").unwrap(), Value::Float64(10.0));
        assert_eq!(out.value(0, "x").unwrap(), Value::Str("replaced".into()));
    }

    #[test]
    fn select_and_rename() {
        let df = points();
        let out = df.select(["y", "x"]).unwrap();
        assert_eq!(out.column_names(), &["y", "x"]);
        assert!(matches!(df.select(["x", "x"]), Err(Error::DuplicateColumnName(_))));
        assert!(matches!(df.select(["z"]), Err(Error::ColumnNotFound(_))));

        let renamed = df.rename([("x", "lon")]).unwrap();
        assert_eq!(renamed.column_names(), &["lon", "y"]);
        assert!(renamed.column("lon").is_ok());
        assert!(matches!(df.rename([("x", "y")]), Err(Error::DuplicateColumnName(_))));
        assert!(matches!(df.rename([("q", "r")]), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn arrange_puts_missing_last() {
        let mut df = DataFrame::new();
        df.add_column("v", Int64Column::from_options(vec![Some(2), None, Some(1), Some(3)]))
            .unwrap();
        let asc = df.arrange(["v"]).unwrap();
        assert_eq!(
            asc.column("v").unwrap().values(),
            vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Null]
        );
        let desc = df.arrange([SortKey::desc("v")]).unwrap();
        assert_eq!(
            desc.column("v").unwrap().values(),
            vec![Value::Int64(3), Value::Int64(2), Value::Int64(1), Value::Null]
        );
    }

    #[test]
    fn arrange_is_stable_and_uses_levels() {
        let mut df = DataFrame::new();
        df.add_column(
            "cut",
            CategoricalColumn::new(
                vec!["Ideal", "Fair", "Ideal", "Good"],
                Some(vec!["Fair".into(), "Good".into(), "Ideal".into()]),
                true,
            )
            .unwrap(),
        )
        .unwrap();
        df.add_int_column("id", vec![1, 2, 3, 4]).unwrap();
        let out = df.arrange([SortKey::desc("cut")]).unwrap();
        assert_eq!(
            out.column("id").unwrap().values(),
            vec![Value::Int64(1), Value::Int64(3), Value::Int64(4), Value::Int64(2)]
        );
    }

    #[test]
    fn ungrouped_summarise_is_one_row() {
        let df = points();
        let out = df
            .summarise([("n", n()), ("mean_x", mean(col("x")))])
            .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.value(0, "n").unwrap(), Value::Int64(3));
        assert_eq!(out.value(0, "mean_x").unwrap(), Value::Float64(7.0 / 3.0));

        let empty = df.filter([col("x").gt(lit(100))]).unwrap();
        let out = empty.summarise([("n", n())]).unwrap();
        assert_eq!(out.value(0, "n").unwrap(), Value::Int64(0));
        assert!(empty.summarise([("m", mean(col("x")))]).is_err());
    }

    #[test]
    fn count_by_key() {
        let df = DataFrame::from_columns([("k", Int64Column::new(vec![1, 2, 1, 1]))]).unwrap();
        let out = df.count(["k"]).unwrap();
        assert_eq!(out.column_names(), &["k", "n"]);
        assert_eq!(
            out.column("n").unwrap().values(),
            vec![Value::Int64(3), Value::Int64(1)]
        );
    }
}
