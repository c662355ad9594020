//! Grouping of DataFrame rows by key columns
//!
//! Groups are kept in order of first appearance, so results are
//! deterministic and follow the input order.

mod aggregate;

use std::collections::HashMap;

use log::{debug, trace};

use crate::column::{Column, Value};
use crate::dataframe::{DataFrame, SortKey};
use crate::error::{Error, Result};
use crate::expr::{check_predicates, n, Evaluator, Expr};

pub use aggregate::AggFunc;
pub(crate) use aggregate::summarise_partitions;

/// Hashable form of one key value
///
/// Missing is a key of its own, so missing values group together. Floats
/// are keyed by bit pattern with `-0.0` folded into `0.0` and every NaN
/// folded into one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Str(String),
    Factor(String),
}

impl From<&Value> for GroupKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => GroupKey::Null,
            Value::Int64(v) => GroupKey::Int64(*v),
            Value::Float64(v) => {
                let v = if *v == 0.0 {
                    0.0
                } else if v.is_nan() {
                    f64::NAN
                } else {
                    *v
                };
                GroupKey::Float64(v.to_bits())
            }
            Value::Bool(v) => GroupKey::Bool(*v),
            Value::Str(v) => GroupKey::Str(v.clone()),
            Value::Factor(f) => GroupKey::Factor(f.label().to_string()),
        }
    }
}

/// One group: its key tuple and the rows sharing it, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: Vec<GroupKey>,
    pub rows: Vec<usize>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A DataFrame together with a partition of its rows
#[derive(Debug, Clone)]
pub struct GroupedFrame {
    frame: DataFrame,
    keys: Vec<String>,
    partitions: Vec<Partition>,
}

impl DataFrame {
    /// Group rows by the values of `columns`
    ///
    /// # Arguments
    /// * `columns` - key column names
    ///
    /// # Returns
    /// * `Result<GroupedFrame>` - groups in order of first appearance
    pub fn group_by<I, S>(&self, columns: I) -> Result<GroupedFrame>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = columns
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        if keys.is_empty() {
            return Err(Error::InvalidInput(
                "group_by needs at least one key column".to_string(),
            ));
        }

        let mut key_columns: Vec<&Column> = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(Error::DuplicateColumnName(key.clone()));
            }
            key_columns.push(self.column(key)?);
        }

        let mut positions: HashMap<Vec<GroupKey>, usize> = HashMap::new();
        let mut partitions: Vec<Partition> = Vec::new();

        for row_idx in 0..self.row_count() {
            let key = key_columns
                .iter()
                .map(|col| col.value(row_idx).map(|v| GroupKey::from(&v)))
                .collect::<Result<Vec<_>>>()?;

            match positions.get(&key) {
                Some(&pos) => partitions[pos].rows.push(row_idx),
                None => {
                    positions.insert(key.clone(), partitions.len());
                    partitions.push(Partition {
                        key,
                        rows: vec![row_idx],
                    });
                }
            }
        }

        trace!(
            "group_by {:?}: {} rows in {} groups",
            keys,
            self.row_count(),
            partitions.len()
        );

        Ok(GroupedFrame {
            frame: self.clone(),
            keys,
            partitions,
        })
    }
}

impl GroupedFrame {
    /// The underlying (ungrouped) DataFrame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn group_count(&self) -> usize {
        self.partitions.len()
    }

    /// Row count of each group, in group order
    pub fn sizes(&self) -> Vec<usize> {
        self.partitions.iter().map(Partition::len).collect()
    }

    /// Drop the grouping
    pub fn ungroup(self) -> DataFrame {
        self.frame
    }

    /// Keep rows where every predicate is true, evaluating aggregates
    /// within each group
    ///
    /// The result is regrouped by the same keys.
    pub fn filter<I>(&self, predicates: I) -> Result<GroupedFrame>
    where
        I: IntoIterator<Item = Expr>,
    {
        let predicates: Vec<Expr> = predicates.into_iter().collect();
        let schema = self.frame.schema();
        check_predicates(&schema, &predicates)?;

        let mut keep = Vec::new();
        for partition in &self.partitions {
            let evaluator = Evaluator::with_rows(&self.frame, &schema, &partition.rows);
            let mask = evaluator.predicate_mask(&predicates)?;
            keep.extend(
                partition
                    .rows
                    .iter()
                    .zip(&mask)
                    .filter(|(_, m)| m.is_true())
                    .map(|(&row, _)| row),
            );
        }
        keep.sort_unstable();

        trace!(
            "grouped filter kept {} of {} rows",
            keep.len(),
            self.frame.row_count()
        );
        self.frame.take_rows(&keep)?.group_by(&self.keys)
    }

    /// Add or replace columns, evaluating aggregates within each group
    ///
    /// Results are scattered back into the original row order and the
    /// grouping is consumed.
    pub fn mutate<I, S>(&self, exprs: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        let mut result = self.frame.clone();
        for (name, expr) in exprs {
            let name = name.into();
            let schema = result.schema();
            let column_type = expr.resolve_type(&schema)?;

            let mut values = vec![Value::Null; result.row_count()];
            for partition in &self.partitions {
                let evaluator = Evaluator::with_rows(&result, &schema, &partition.rows);
                let datum = evaluator.eval(&expr)?;
                for (pos, &row) in partition.rows.iter().enumerate() {
                    values[row] = datum.get(pos).clone();
                }
            }

            let column = Column::from_values(column_type, values)?;
            result = result.with_column(name, column)?;
        }
        Ok(result)
    }

    /// One row per group: key columns, then one column per aggregation
    pub fn summarise<I, S>(&self, aggregations: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        let aggregations: Vec<(String, Expr)> = aggregations
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .collect();
        summarise_partitions(&self.frame, &self.keys, &self.partitions, &aggregations)
    }

    /// Row count per group, as column `n`
    pub fn count(&self) -> Result<DataFrame> {
        self.summarise([("n", n())])
    }

    /// Stable sort of the underlying rows; the grouping is kept
    pub fn arrange<I, K>(&self, keys: I) -> Result<GroupedFrame>
    where
        I: IntoIterator<Item = K>,
        K: Into<SortKey>,
    {
        self.frame.arrange(keys)?.group_by(&self.keys)
    }

    /// Rename columns, carrying renamed key columns into the grouping
    pub fn rename<I, S, T>(&self, renames: I) -> Result<GroupedFrame>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: Into<String>,
    {
        let renames: Vec<(String, String)> = renames
            .into_iter()
            .map(|(old, new)| (old.as_ref().to_string(), new.into()))
            .collect();
        let frame = self
            .frame
            .rename(renames.iter().map(|(old, new)| (old.as_str(), new.clone())))?;

        let mut keys = self.keys.clone();
        for (old, new) in &renames {
            for key in keys.iter_mut() {
                if *key == *old {
                    *key = new.clone();
                }
            }
        }
        Ok(GroupedFrame {
            frame,
            keys,
            partitions: self.partitions.clone(),
        })
    }

    /// Keep the listed columns; key columns not listed are kept in front
    pub fn select<I, S>(&self, columns: I) -> Result<GroupedFrame>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        let missing: Vec<&String> = self.keys.iter().filter(|k| !columns.contains(k)).collect();
        if !missing.is_empty() {
            debug!("select keeps grouping columns {:?}", missing);
        }
        let frame = self.frame.select(missing.into_iter().chain(columns.iter()))?;
        Ok(GroupedFrame {
            frame,
            keys: self.keys.clone(),
            partitions: self.partitions.clone(),
        })
    }
}
