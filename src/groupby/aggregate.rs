//! Reductions over one partition
//!
//! Every aggregate shares the same missing-value rule: without `na_rm` a
//! single missing input makes the result missing; with `na_rm` missing
//! inputs are dropped first. `n()` counts rows and ignores the rule.

use std::collections::HashSet;

use log::trace;
use rayon::prelude::*;

use crate::column::{ColumnType, Value};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::expr::{Datum, Evaluator, Expr};
use crate::groupby::{GroupKey, Partition};

// Below this many groups summarise runs serially
const PARALLEL_THRESHOLD: usize = 1_000;

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggFunc {
    /// Row count, `n()`
    Count,
    /// Number of distinct values
    CountDistinct,
    Mean,
    Median,
    /// Sample quantile with linear interpolation, `p` in `[0, 1]`
    Quantile(f64),
    Sum,
    /// Number of true values
    CountTrue,
    Min,
    Max,
    /// Sample standard deviation (n - 1 denominator)
    Sd,
    First,
    Last,
}

fn describe(ty: Option<ColumnType>) -> String {
    ty.map_or_else(|| "NA".to_string(), |t| t.to_string())
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Count => "n",
            AggFunc::CountDistinct => "n_distinct",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
            AggFunc::Quantile(_) => "quantile",
            AggFunc::Sum => "sum",
            AggFunc::CountTrue => "count_true",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Sd => "sd",
            AggFunc::First => "first",
            AggFunc::Last => "last",
        }
    }

    fn check_probability(&self) -> Result<()> {
        if let AggFunc::Quantile(p) = self {
            if !(0.0..=1.0).contains(p) {
                return Err(Error::AggregateDomain(format!(
                    "quantile probability must be in [0, 1], got {}",
                    p
                )));
            }
        }
        Ok(())
    }

    /// Result type for an argument of type `input`
    ///
    /// `input` is `None` for an untyped missing argument. `has_arg` is false
    /// only for `n()`.
    pub fn result_type(&self, input: Option<ColumnType>, has_arg: bool) -> Result<ColumnType> {
        let context = format!("{}()", self.name());
        if has_arg == (*self == AggFunc::Count) {
            return Err(Error::InvalidInput(if has_arg {
                "n() takes no arguments".to_string()
            } else {
                format!("{} needs an argument", context)
            }));
        }
        self.check_probability()?;

        let numeric = input.map_or(true, |t| t.is_numeric());
        let boolean = input.map_or(true, |t| t == ColumnType::Boolean);
        match self {
            AggFunc::Count | AggFunc::CountDistinct => Ok(ColumnType::Int64),
            AggFunc::CountTrue if boolean => Ok(ColumnType::Int64),
            AggFunc::CountTrue => Err(Error::type_mismatch(context, ColumnType::Boolean, describe(input))),
            AggFunc::Sum => match input {
                None | Some(ColumnType::Int64) | Some(ColumnType::Boolean) => Ok(ColumnType::Int64),
                Some(ColumnType::Float64) => Ok(ColumnType::Float64),
                Some(other) => Err(Error::type_mismatch(context, "numeric or boolean", other)),
            },
            AggFunc::Mean if numeric || boolean => Ok(ColumnType::Float64),
            AggFunc::Median | AggFunc::Quantile(_) | AggFunc::Sd if numeric => Ok(ColumnType::Float64),
            AggFunc::Mean | AggFunc::Median | AggFunc::Quantile(_) | AggFunc::Sd => {
                Err(Error::type_mismatch(context, "numeric", describe(input)))
            }
            AggFunc::Min | AggFunc::Max => match input {
                Some(ColumnType::Boolean) => {
                    Err(Error::type_mismatch(context, "numeric, string or ordered factor", ColumnType::Boolean))
                }
                other => Ok(other.unwrap_or(ColumnType::Boolean)),
            },
            AggFunc::First | AggFunc::Last => Ok(input.unwrap_or(ColumnType::Boolean)),
        }
    }

    /// Reduce the values of one partition
    ///
    /// `input` is the argument's inferred type, used to pick the result
    /// representation of sums over no values.
    pub fn reduce(&self, values: &[Value], na_rm: bool, input: Option<ColumnType>) -> Result<Value> {
        if *self == AggFunc::Count {
            return Ok(Value::Int64(values.len() as i64));
        }
        self.check_probability()?;

        if !na_rm && values.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();

        match self {
            AggFunc::Count => Ok(Value::Int64(values.len() as i64)),
            AggFunc::CountDistinct => {
                let distinct: HashSet<GroupKey> = present.iter().map(|v| GroupKey::from(*v)).collect();
                Ok(Value::Int64(distinct.len() as i64))
            }
            AggFunc::CountTrue => Ok(Value::Int64(
                present.iter().filter(|v| matches!(v, Value::Bool(true))).count() as i64,
            )),
            AggFunc::Sum => sum(&present, input),
            AggFunc::Mean => {
                let numbers = self.numbers(&present)?;
                Ok(Value::Float64(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
            AggFunc::Median => quantile(self.numbers(&present)?, 0.5),
            AggFunc::Quantile(p) => quantile(self.numbers(&present)?, *p),
            AggFunc::Sd => {
                if present.len() < 2 {
                    return Ok(Value::Null);
                }
                let numbers = self.numbers(&present)?;
                let n = numbers.len() as f64;
                let mean = numbers.iter().sum::<f64>() / n;
                let ss: f64 = numbers.iter().map(|x| (x - mean).powi(2)).sum();
                Ok(Value::Float64((ss / (n - 1.0)).sqrt()))
            }
            AggFunc::Min | AggFunc::Max => self.extreme(&present),
            AggFunc::First => present
                .first()
                .map(|v| (*v).clone())
                .ok_or_else(|| self.empty_input()),
            AggFunc::Last => present
                .last()
                .map(|v| (*v).clone())
                .ok_or_else(|| self.empty_input()),
        }
    }

    fn empty_input(&self) -> Error {
        Error::AggregateDomain(format!("{}() of no values", self.name()))
    }

    /// Numeric view of the inputs; empty input is a domain error
    fn numbers(&self, present: &[&Value]) -> Result<Vec<f64>> {
        if present.is_empty() {
            return Err(self.empty_input());
        }
        present
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    Error::type_mismatch(format!("{}()", self.name()), "numeric", v.to_string())
                })
            })
            .collect()
    }

    fn extreme(&self, present: &[&Value]) -> Result<Value> {
        let mut best: Option<&Value> = None;
        for value in present.iter().copied() {
            if let Value::Factor(f) = value {
                if !f.levels().is_ordered() {
                    return Err(Error::type_mismatch(
                        format!("{}()", self.name()),
                        "ordered factor",
                        "unordered factor",
                    ));
                }
            }
            best = match best {
                None => Some(value),
                Some(current) => {
                    let ordering = value.sort_cmp(current);
                    let better = match self {
                        AggFunc::Min => ordering.is_lt(),
                        _ => ordering.is_gt(),
                    };
                    Some(if better { value } else { current })
                }
            };
        }
        best.cloned().ok_or_else(|| self.empty_input())
    }
}

fn sum(present: &[&Value], input: Option<ColumnType>) -> Result<Value> {
    if input == Some(ColumnType::Float64) {
        let total: f64 = present.iter().filter_map(|v| v.as_f64()).sum();
        return Ok(Value::Float64(total));
    }

    let mut total: i64 = 0;
    for value in present {
        let v = value
            .as_i64()
            .ok_or_else(|| Error::type_mismatch("sum()", "integer or boolean", value.to_string()))?;
        total = total
            .checked_add(v)
            .ok_or_else(|| Error::AggregateDomain("integer overflow in sum()".to_string()))?;
    }
    Ok(Value::Int64(total))
}

/// Linear interpolation between order statistics: `h = (n - 1) p`
fn quantile(mut numbers: Vec<f64>, p: f64) -> Result<Value> {
    numbers.sort_by(f64::total_cmp);
    let h = (numbers.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let (a, b) = (numbers[lo], numbers[hi]);
    let weight = h - lo as f64;
    let value = if lo == hi || a == b {
        a
    } else if a.is_finite() && b.is_finite() {
        a + weight * (b - a)
    } else {
        // inf - inf is NaN
        (1.0 - weight) * a + weight * b
    };
    Ok(Value::Float64(value))
}

/// One output row per partition: key columns first, then one column per
/// aggregation, in the order given
pub(crate) fn summarise_partitions(
    frame: &DataFrame,
    keys: &[String],
    partitions: &[Partition],
    aggregations: &[(String, Expr)],
) -> Result<DataFrame> {
    let schema = frame.schema();
    let first_rows: Vec<usize> = partitions
        .iter()
        .filter_map(|p| p.rows.first().copied())
        .collect();

    let mut result = DataFrame::new();
    for key in keys {
        result.add_column(key.clone(), frame.column(key)?.take(&first_rows))?;
    }

    for (name, expr) in aggregations {
        if expr.has_bare_column() {
            return Err(Error::type_mismatch(
                format!("summarise `{}`", name),
                "one value per group",
                format!("column expression `{}`", expr),
            ));
        }
        let column_type = expr.resolve_type(&schema)?;

        let reduce_one = |partition: &Partition| -> Result<Value> {
            let evaluator = Evaluator::with_rows(frame, &schema, &partition.rows);
            match evaluator.eval(expr)? {
                Datum::Scalar(value) => Ok(value),
                Datum::Vector(_) => Err(Error::type_mismatch(
                    format!("summarise `{}`", name),
                    "one value per group",
                    "one value per row",
                )),
            }
        };

        let values = if partitions.len() >= PARALLEL_THRESHOLD {
            trace!("summarise `{}` over {} groups in parallel", name, partitions.len());
            partitions.par_iter().map(reduce_one).collect::<Result<Vec<_>>>()?
        } else {
            partitions.iter().map(reduce_one).collect::<Result<Vec<_>>>()?
        };

        result.add_values(name.clone(), column_type, values)?;
    }

    Ok(result)
}
