//! Vectorised expression evaluation
//!
//! An [`Evaluator`] binds a DataFrame (optionally restricted to a subset of
//! its rows, one group) and evaluates expressions column-at-a-time. Results
//! that do not depend on any row stay scalar and broadcast on use.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::ops::Add;

use num_traits::Zero;

use crate::column::{Column, ColumnType, Value};
use crate::dataframe::{DataFrame, Schema};
use crate::error::{Error, Result};
use crate::expr::{BinaryOp, Expr, ScalarFunc, UnaryOp};
use crate::na::{Logical, NA};

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// One value for every row
    Scalar(Value),
    /// One value per row
    Vector(Vec<Value>),
}

impl Datum {
    /// Value for row `i`, broadcasting scalars
    pub fn get(&self, i: usize) -> &Value {
        match self {
            Datum::Scalar(v) => v,
            Datum::Vector(values) => &values[i],
        }
    }

    /// Materialize `len` values
    pub fn into_values(self, len: usize) -> Vec<Value> {
        match self {
            Datum::Scalar(v) => vec![v; len],
            Datum::Vector(values) => values,
        }
    }

    fn map<F>(self, f: F) -> Result<Datum>
    where
        F: Fn(&Value) -> Result<Value>,
    {
        match self {
            Datum::Scalar(v) => Ok(Datum::Scalar(f(&v)?)),
            Datum::Vector(values) => values.iter().map(f).collect::<Result<Vec<_>>>().map(Datum::Vector),
        }
    }

    fn zip_with<F>(self, other: Datum, f: F) -> Result<Datum>
    where
        F: Fn(&Value, &Value) -> Result<Value>,
    {
        match (self, other) {
            (Datum::Scalar(a), Datum::Scalar(b)) => Ok(Datum::Scalar(f(&a, &b)?)),
            (Datum::Scalar(a), Datum::Vector(b)) => {
                b.iter().map(|y| f(&a, y)).collect::<Result<Vec<_>>>().map(Datum::Vector)
            }
            (Datum::Vector(a), Datum::Scalar(b)) => {
                a.iter().map(|x| f(x, &b)).collect::<Result<Vec<_>>>().map(Datum::Vector)
            }
            (Datum::Vector(a), Datum::Vector(b)) => a
                .iter()
                .zip(&b)
                .map(|(x, y)| f(x, y))
                .collect::<Result<Vec<_>>>()
                .map(Datum::Vector),
        }
    }
}

/// Evaluates expressions against a DataFrame or one of its row subsets
pub struct Evaluator<'a> {
    frame: &'a DataFrame,
    schema: Cow<'a, Schema>,
    rows: Option<&'a [usize]>,
}

impl<'a> Evaluator<'a> {
    /// Evaluate over every row of `frame`
    pub fn new(frame: &'a DataFrame) -> Self {
        Self {
            frame,
            schema: Cow::Owned(frame.schema()),
            rows: None,
        }
    }

    /// Evaluate over the rows at `rows` only
    pub fn with_rows(frame: &'a DataFrame, schema: &'a Schema, rows: &'a [usize]) -> Self {
        Self {
            frame,
            schema: Cow::Borrowed(schema),
            rows: Some(rows),
        }
    }

    /// Number of rows in scope
    pub fn len(&self) -> usize {
        self.rows.map_or(self.frame.row_count(), <[usize]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Type-check and evaluate `expr`
    pub fn evaluate(&self, expr: &Expr) -> Result<Datum> {
        expr.resolve_type(&self.schema)?;
        self.eval(expr)
    }

    /// Type-check and evaluate `expr` into a column of its resolved type
    pub fn evaluate_column(&self, expr: &Expr) -> Result<Column> {
        let column_type = expr.resolve_type(&self.schema)?;
        let values = self.eval(expr)?.into_values(self.len());
        Column::from_values(column_type, values)
    }

    /// Combine predicates with three-valued AND into a per-row truth mask
    ///
    /// No predicates keeps every row.
    pub fn evaluate_predicates(&self, predicates: &[Expr]) -> Result<Vec<Logical>> {
        check_predicates(&self.schema, predicates)?;
        self.predicate_mask(predicates)
    }

    pub(crate) fn predicate_mask(&self, predicates: &[Expr]) -> Result<Vec<Logical>> {
        let mut mask = vec![NA::Value(true); self.len()];
        for predicate in predicates {
            let datum = self.eval(predicate)?;
            for (i, slot) in mask.iter_mut().enumerate() {
                *slot = *slot & to_logical(datum.get(i))?;
            }
        }
        Ok(mask)
    }

    /// Evaluate an expression that has already been type-checked
    pub(crate) fn eval(&self, expr: &Expr) -> Result<Datum> {
        match expr {
            Expr::Literal(value) => Ok(Datum::Scalar(value.clone())),
            Expr::Column(name) => {
                let column = self.frame.column(name)?;
                let values = match self.rows {
                    Some(rows) => rows.iter().map(|&i| column.value(i)).collect::<Result<Vec<_>>>()?,
                    None => column.values(),
                };
                Ok(Datum::Vector(values))
            }
            Expr::Unary { op, operand } => {
                let op = *op;
                self.eval(operand)?.map(|v| unary_op(op, v))
            }
            Expr::Binary { left, op, right } => {
                let op = *op;
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                l.zip_with(r, |a, b| binary_op(a, op, b))
            }
            Expr::InSet { expr, set } => {
                let members: Vec<&Value> = set.iter().filter(|m| !m.is_null()).collect();
                self.eval(expr)?.map(|v| set_membership(v, &members))
            }
            Expr::Function { func, args } => {
                let datums = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>>>()?;
                if datums.iter().all(|d| matches!(d, Datum::Scalar(_))) {
                    let values: Vec<Value> = datums.iter().map(|d| d.get(0).clone()).collect();
                    return Ok(Datum::Scalar(scalar_function(*func, &values)?));
                }

                let mut out = Vec::with_capacity(self.len());
                let mut row = Vec::with_capacity(datums.len());
                for i in 0..self.len() {
                    row.clear();
                    row.extend(datums.iter().map(|d| d.get(i).clone()));
                    out.push(scalar_function(*func, &row)?);
                }
                Ok(Datum::Vector(out))
            }
            Expr::Aggregate { func, arg, na_rm } => match arg {
                None => func.reduce(&vec![Value::Null; self.len()], true, None).map(Datum::Scalar),
                Some(arg) => {
                    let input = arg.infer(&self.schema)?;
                    let values = self.eval(arg)?.into_values(self.len());
                    func.reduce(&values, *na_rm, input).map(Datum::Scalar)
                }
            },
        }
    }
}

pub(crate) fn check_predicates(schema: &Schema, predicates: &[Expr]) -> Result<()> {
    for predicate in predicates {
        let ty = predicate.resolve_type(schema)?;
        if ty != ColumnType::Boolean {
            return Err(Error::type_mismatch(
                format!("predicate `{}`", predicate),
                ColumnType::Boolean,
                ty,
            ));
        }
    }
    Ok(())
}

fn to_logical(value: &Value) -> Result<Logical> {
    match value {
        Value::Bool(b) => Ok(NA::Value(*b)),
        Value::Null => Ok(NA::NA),
        other => Err(Error::type_mismatch("logical operand", ColumnType::Boolean, type_name(other))),
    }
}

fn unary_op(op: UnaryOp, value: &Value) -> Result<Value> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int64(i)) => Ok(i.checked_neg().map_or(Value::Null, Value::Int64)),
        (UnaryOp::Negate, Value::Float64(f)) => Ok(Value::Float64(-f)),
        (UnaryOp::Not, other) => Err(Error::type_mismatch("operator !", ColumnType::Boolean, type_name(other))),
        (UnaryOp::Negate, other) => Err(Error::type_mismatch("unary -", "numeric", type_name(other))),
    }
}

fn numeric(context: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Int64(i) => Ok(*i as f64),
        Value::Float64(f) => Ok(*f),
        other => Err(Error::type_mismatch(context, "numeric", type_name(other))),
    }
}

/// Apply a binary operator to two scalars
pub(crate) fn binary_op(left: &Value, op: BinaryOp, right: &Value) -> Result<Value> {
    if op.is_logical() {
        let (l, r) = (to_logical(left)?, to_logical(right)?);
        let result = match op {
            BinaryOp::And => l & r,
            _ => l | r,
        };
        return Ok(result.into());
    }

    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    match op {
        BinaryOp::Equal => Ok(values_equal(left, right)?.map_or(Value::Null, Value::Bool)),
        BinaryOp::NotEqual => Ok(values_equal(left, right)?.map_or(Value::Null, |eq| Value::Bool(!eq))),
        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => {
            let ordering = match compare_values(left, right)? {
                Some(ordering) => ordering,
                // NaN compares as missing
                None => return Ok(Value::Null),
            };
            let result = match op {
                BinaryOp::LessThan => ordering == Ordering::Less,
                BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
                BinaryOp::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        _ => arithmetic(left, op, right),
    }
}

fn arithmetic(left: &Value, op: BinaryOp, right: &Value) -> Result<Value> {
    let context = format!("operator {}", op.symbol());
    if let (Value::Int64(a), Value::Int64(b)) = (left, right) {
        let result = match op {
            BinaryOp::Add => Some(NA::<i64>::from(a.checked_add(*b))),
            BinaryOp::Subtract => Some(NA::<i64>::from(a.checked_sub(*b))),
            BinaryOp::Multiply => Some(NA::<i64>::from(a.checked_mul(*b))),
            // i64::MIN % -1 overflows
            BinaryOp::Modulo if *b == -1 => Some(NA::Value(0)),
            BinaryOp::Modulo => Some((NA::Value(*a) % NA::Value(*b)).map(|r| floored(*r, *b))),
            _ => None,
        };
        if let Some(result) = result {
            return Ok(result.value().map_or(Value::Null, |v| Value::Int64(*v)));
        }
    }

    let divisor = numeric(&context, right)?;
    let a = NA::Value(numeric(&context, left)?);
    let b = NA::Value(divisor);
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        BinaryOp::Modulo => (a % b).map(|r| floored(*r, divisor)),
        BinaryOp::Power => match (a, b) {
            (NA::Value(x), NA::Value(y)) => NA::Value(x.powf(y)),
            _ => NA::NA,
        },
        _ => return Err(Error::type_mismatch(context, "arithmetic operator", op.symbol())),
    };
    Ok(result.value().map_or(Value::Null, |v| Value::Float64(*v)))
}

/// Remainder with the sign of the divisor, so `-7 % 3 == 2`
fn floored<T>(remainder: T, divisor: T) -> T
where
    T: Copy + PartialOrd + Zero + Add<Output = T>,
{
    let zero = T::zero();
    if remainder != zero && (remainder < zero) != (divisor < zero) {
        remainder + divisor
    } else {
        remainder
    }
}

/// `%in%` test for one value; labels outside a factor's levels never match
fn set_membership(value: &Value, members: &[&Value]) -> Result<Value> {
    match value {
        Value::Null => return Ok(Value::Null),
        Value::Float64(x) if x.is_nan() => return Ok(Value::Null),
        _ => {}
    }
    for member in members {
        let matched = match (value, member) {
            (Value::Factor(f), Value::Str(s)) => f.label() == s,
            _ => values_equal(value, member)?.unwrap_or(false),
        };
        if matched {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Equality of two non-missing scalars; `None` when either side is NaN
pub(crate) fn values_equal(left: &Value, right: &Value) -> Result<Option<bool>> {
    match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => Ok(Some(a == b)),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a == b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a == b)),
        (Value::Factor(a), Value::Factor(b)) => Ok(Some(a.label() == b.label())),
        (Value::Factor(f), Value::Str(s)) | (Value::Str(s), Value::Factor(f)) => {
            if f.levels().position(s).is_none() {
                return Err(Error::type_mismatch(
                    "factor comparison",
                    format!("one of the levels {:?}", f.levels().labels()),
                    format!("\"{}\"", s),
                ));
            }
            Ok(Some(f.label() == s))
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) if !matches!(a, Value::Bool(_)) && !matches!(b, Value::Bool(_)) => {
                Ok(if x.is_nan() || y.is_nan() { None } else { Some(x == y) })
            }
            _ => Err(Error::type_mismatch("comparison", type_name(a), type_name(b))),
        },
    }
}

/// Ordering of two non-missing scalars; `None` when either side is NaN
pub(crate) fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Factor(a), Value::Factor(b)) => {
            if !a.levels().is_ordered() || !a.same_levels(b) {
                return Err(Error::type_mismatch(
                    "factor ordering",
                    "ordered factors with one level set",
                    "unordered or differing levels",
                ));
            }
            Ok(Some(a.code().cmp(&b.code())))
        }
        (Value::Factor(f), Value::Str(s)) => factor_position(f, s).map(|p| Some(f.code().cmp(&p))),
        (Value::Str(s), Value::Factor(f)) => factor_position(f, s).map(|p| Some(p.cmp(&f.code()))),
        (Value::Int64(_) | Value::Float64(_), Value::Int64(_) | Value::Float64(_)) => {
            let (x, y) = (numeric("comparison", left)?, numeric("comparison", right)?);
            Ok(x.partial_cmp(&y))
        }
        (a, b) => Err(Error::type_mismatch("ordering comparison", type_name(a), type_name(b))),
    }
}

fn factor_position(factor: &crate::column::Factor, label: &str) -> Result<u32> {
    if !factor.levels().is_ordered() {
        return Err(Error::type_mismatch(
            "factor ordering",
            "ordered factor",
            "unordered factor",
        ));
    }
    factor.levels().position(label).ok_or_else(|| {
        Error::type_mismatch(
            "factor ordering",
            format!("one of the levels {:?}", factor.levels().labels()),
            format!("\"{}\"", label),
        )
    })
}

fn type_name(value: &Value) -> String {
    value.column_type().map_or_else(|| "NA".to_string(), |t| t.to_string())
}

fn float_fn(context: &str, value: &Value, f: fn(f64) -> f64) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        other => numeric(context, other).map(|x| Value::Float64(f(x))),
    }
}

fn scalar_function(func: ScalarFunc, args: &[Value]) -> Result<Value> {
    let context = func.name();
    match func {
        ScalarFunc::Abs => match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Int64(i) => Ok(i.checked_abs().map_or(Value::Null, Value::Int64)),
            other => numeric(context, other).map(|x| Value::Float64(x.abs())),
        },
        ScalarFunc::Sqrt => float_fn(context, &args[0], f64::sqrt),
        ScalarFunc::Log => float_fn(context, &args[0], f64::ln),
        ScalarFunc::Log10 => float_fn(context, &args[0], f64::log10),
        ScalarFunc::Exp => float_fn(context, &args[0], f64::exp),
        ScalarFunc::Floor | ScalarFunc::Ceil => match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Int64(i) => Ok(Value::Int64(*i)),
            other => {
                let x = numeric(context, other)?;
                let rounded = if func == ScalarFunc::Floor { x.floor() } else { x.ceil() };
                Ok(Value::Float64(rounded))
            }
        },
        ScalarFunc::Round => {
            let digits = match args.get(1) {
                None => 0,
                Some(Value::Int64(d)) => *d,
                Some(Value::Null) => return Ok(Value::Null),
                Some(other) => return Err(Error::type_mismatch(context, ColumnType::Int64, type_name(other))),
            };
            match &args[0] {
                Value::Null => Ok(Value::Null),
                Value::Int64(i) => Ok(Value::Int64(*i)),
                other => {
                    let x = numeric(context, other)?;
                    let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
                    Ok(Value::Float64((x * scale).round() / scale))
                }
            }
        }
        ScalarFunc::IsNa => Ok(Value::Bool(args[0].is_null())),
        ScalarFunc::IfElse => match to_logical(&args[0])? {
            NA::Value(true) => Ok(args[1].clone()),
            NA::Value(false) => Ok(args[2].clone()),
            NA::NA => Ok(Value::Null),
        },
        ScalarFunc::Between => {
            if args.iter().any(Value::is_null) {
                return Ok(Value::Null);
            }
            let above = compare_values(&args[0], &args[1])?;
            let below = compare_values(&args[0], &args[2])?;
            match (above, below) {
                (Some(lo), Some(hi)) => {
                    Ok(Value::Bool(lo != Ordering::Less && hi != Ordering::Greater))
                }
                _ => Ok(Value::Null),
            }
        }
        ScalarFunc::Coalesce => Ok(if args[0].is_null() {
            args[1].clone()
        } else {
            args[0].clone()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{CategoricalColumn, Float64Column, Int64Column};
    use crate::expr::{col, lit, mean, null};

    fn frame() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column("x", Int64Column::from_options(vec![Some(1), None, Some(3), Some(4)]))
            .unwrap();
        df.add_column(
            "y",
            Float64Column::from_options(vec![Some(0.5), Some(1.0), None, Some(0.0)]),
        )
        .unwrap();
        df.add_column(
            "cut",
            CategoricalColumn::new(
                vec!["Fair", "Good", "Ideal", "Good"],
                Some(vec!["Fair".into(), "Good".into(), "Ideal".into()]),
                true,
            )
            .unwrap(),
        )
        .unwrap();
        df
    }

    #[test]
    fn missing_propagates_through_arithmetic() {
        let df = frame();
        let values = Evaluator::new(&df)
            .evaluate(&(col("x") + col("y")))
            .unwrap()
            .into_values(4);
        assert_eq!(
            values,
            vec![Value::Float64(1.5), Value::Null, Value::Null, Value::Float64(4.0)]
        );
    }

    #[test]
    fn division_by_zero_is_missing() {
        let df = frame();
        let datum = Evaluator::new(&df).evaluate(&(col("x") / col("y"))).unwrap();
        assert_eq!(datum.get(0), &Value::Float64(2.0));
        assert_eq!(datum.get(3), &Value::Null);
        let datum = Evaluator::new(&df).evaluate(&(col("x") % lit(0))).unwrap();
        assert_eq!(datum.get(0), &Value::Null);
    }

    #[test]
    fn kleene_logic_in_predicates() {
        let df = frame();
        let mask = Evaluator::new(&df)
            .evaluate_predicates(&[col("x").gt(lit(2)) | col("y").lt(lit(0.75))])
            .unwrap();
        assert_eq!(
            mask,
            vec![NA::Value(true), NA::NA, NA::Value(true), NA::Value(true)]
        );
    }

    #[test]
    fn non_boolean_predicate_is_rejected() {
        let df = frame();
        let err = Evaluator::new(&df).evaluate_predicates(&[col("x")]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn ordered_factor_comparison_uses_levels() {
        let df = frame();
        let datum = Evaluator::new(&df)
            .evaluate(&col("cut").gt_eq(lit("Good")))
            .unwrap();
        assert_eq!(
            datum.into_values(4),
            vec![Value::Bool(false), Value::Bool(true), Value::Bool(true), Value::Bool(true)]
        );
        // "Premium" is not a level
        assert!(Evaluator::new(&df).evaluate(&col("cut").gt(lit("Premium"))).is_err());
    }

    #[test]
    fn aggregates_broadcast_over_rows() {
        let df = frame();
        let datum = Evaluator::new(&df)
            .evaluate(&(col("x") - mean(col("x")).na_rm()))
            .unwrap();
        assert_eq!(datum.get(0), &Value::Float64(1.0 - 8.0 / 3.0));
        assert_eq!(datum.get(1), &Value::Null);
    }

    #[test]
    fn row_subset() {
        let df = frame();
        let schema = df.schema();
        let rows = [2, 3];
        let evaluator = Evaluator::with_rows(&df, &schema, &rows);
        assert_eq!(
            evaluator.evaluate(&mean(col("x"))).unwrap(),
            Datum::Scalar(Value::Float64(3.5))
        );
        assert_eq!(
            evaluator.evaluate(&col("y").is_na()).unwrap(),
            Datum::Vector(vec![Value::Bool(true), Value::Bool(false)])
        );
    }

    #[test]
    fn membership_with_missing() {
        let df = frame();
        let datum = Evaluator::new(&df)
            .evaluate(&col("x").is_in([1, 4]))
            .unwrap();
        assert_eq!(
            datum.into_values(4),
            vec![Value::Bool(true), Value::Null, Value::Bool(false), Value::Bool(true)]
        );
        assert_eq!(
            binary_op(&Value::Null, BinaryOp::Or, &Value::Bool(true)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Evaluator::new(&df).evaluate(&null()).unwrap(),
            Datum::Scalar(Value::Null)
        );
    }

    #[test]
    fn nan_equality_is_missing() {
        let mut df = DataFrame::new();
        df.add_float_column("x", vec![f64::NAN, 1.0, 2.0]).unwrap();
        let evaluator = Evaluator::new(&df);

        let eq = evaluator.evaluate(&col("x").equal(lit(1.0))).unwrap();
        assert_eq!(
            eq.into_values(3),
            vec![Value::Null, Value::Bool(true), Value::Bool(false)]
        );
        let ne = evaluator.evaluate(&col("x").not_equal(lit(1.0))).unwrap();
        assert_eq!(
            ne.into_values(3),
            vec![Value::Null, Value::Bool(false), Value::Bool(true)]
        );
        let member = evaluator.evaluate(&col("x").is_in([1.0, f64::NAN])).unwrap();
        assert_eq!(
            member.into_values(3),
            vec![Value::Null, Value::Bool(true), Value::Bool(false)]
        );

        // `!=` and `<` now agree on the NaN row
        assert_eq!(df.filter([col("x").not_equal(lit(1.0))]).unwrap().row_count(), 1);
        assert_eq!(df.filter([col("x").lt(lit(1.0))]).unwrap().row_count(), 0);
    }

    #[test]
    fn factor_membership_ignores_unknown_labels() {
        let levels = || Some(vec!["Fair".into(), "Good".into(), "Ideal".into()]);
        let predicate = col("cut").is_in(["Fair", "Premium"]);

        let mut all_fair = DataFrame::new();
        all_fair
            .add_column("cut", CategoricalColumn::new(vec!["Fair", "Fair"], levels(), true).unwrap())
            .unwrap();
        let mut mixed = DataFrame::new();
        mixed
            .add_column("cut", CategoricalColumn::new(vec!["Fair", "Good"], levels(), true).unwrap())
            .unwrap();

        assert_eq!(all_fair.filter([predicate.clone()]).unwrap().row_count(), 2);
        let out = Evaluator::new(&mixed).evaluate(&predicate).unwrap();
        assert_eq!(out.into_values(2), vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        let rem = |a: Value, b: Value| binary_op(&a, BinaryOp::Modulo, &b).unwrap();
        assert_eq!(rem(Value::Int64(-7), Value::Int64(3)), Value::Int64(2));
        assert_eq!(rem(Value::Int64(7), Value::Int64(-3)), Value::Int64(-2));
        assert_eq!(rem(Value::Int64(-6), Value::Int64(3)), Value::Int64(0));
        assert_eq!(rem(Value::Int64(i64::MIN), Value::Int64(-1)), Value::Int64(0));
        assert_eq!(rem(Value::Float64(-7.5), Value::Float64(2.0)), Value::Float64(0.5));
        assert_eq!(rem(Value::Float64(5.0), Value::Float64(0.0)), Value::Null);
    }
}
