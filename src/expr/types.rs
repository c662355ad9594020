//! Static type resolution
//!
//! Every expression is checked against the input schema before evaluation.
//! A bare `NA` literal has no type of its own; it unifies with whatever it
//! meets and defaults to boolean when nothing constrains it.

use crate::column::ColumnType;
use crate::dataframe::Schema;
use crate::error::{Error, Result};
use crate::expr::{BinaryOp, Expr, ScalarFunc, UnaryOp};

/// Inferred type; `None` is an untyped missing value
pub(crate) type Inferred = Option<ColumnType>;

fn describe(ty: Inferred) -> String {
    ty.map_or_else(|| "NA".to_string(), |t| t.to_string())
}

fn is_numeric(ty: Inferred) -> bool {
    ty.map_or(true, |t| t.is_numeric())
}

pub(crate) fn require_numeric(context: &str, ty: Inferred) -> Result<()> {
    if is_numeric(ty) {
        Ok(())
    } else {
        Err(Error::type_mismatch(context, "numeric", describe(ty)))
    }
}

fn require_boolean(context: &str, ty: Inferred) -> Result<()> {
    match ty {
        None | Some(ColumnType::Boolean) => Ok(()),
        Some(other) => Err(Error::type_mismatch(context, ColumnType::Boolean, other)),
    }
}

/// Types that may be tested for equality
fn equality_compatible(left: Inferred, right: Inferred) -> bool {
    match (left, right) {
        (None, _) | (_, None) => true,
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => true,
        (Some(ColumnType::Categorical), Some(ColumnType::String))
        | (Some(ColumnType::String), Some(ColumnType::Categorical)) => true,
        (Some(l), Some(r)) => l == r,
    }
}

/// Types that may be ordered against each other
///
/// Factor ordering also needs an ordered level set, which is only known from
/// the data and is checked at evaluation time.
fn ordering_compatible(left: Inferred, right: Inferred) -> bool {
    match (left, right) {
        (Some(ColumnType::Boolean), _) | (_, Some(ColumnType::Boolean)) => false,
        (None, _) | (_, None) => true,
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => true,
        (Some(ColumnType::String), Some(ColumnType::String)) => true,
        (Some(ColumnType::Categorical), Some(ColumnType::String))
        | (Some(ColumnType::String), Some(ColumnType::Categorical))
        | (Some(ColumnType::Categorical), Some(ColumnType::Categorical)) => true,
        _ => false,
    }
}

/// Common type of two branches
fn unify(context: &str, left: Inferred, right: Inferred) -> Result<Inferred> {
    match (left, right) {
        (None, other) | (other, None) => Ok(other),
        (Some(l), Some(r)) if l == r => Ok(Some(l)),
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => Ok(Some(ColumnType::Float64)),
        (Some(l), Some(r)) => Err(Error::type_mismatch(context, l, r)),
    }
}

fn arithmetic_result(op: BinaryOp, left: Inferred, right: Inferred) -> Inferred {
    match op {
        BinaryOp::Divide | BinaryOp::Power => Some(ColumnType::Float64),
        _ => match (left, right) {
            (None, None) => None,
            (Some(ColumnType::Float64), _) | (_, Some(ColumnType::Float64)) => {
                Some(ColumnType::Float64)
            }
            _ => Some(ColumnType::Int64),
        },
    }
}

impl Expr {
    /// Result type of this expression over `schema`
    ///
    /// Fails with `ColumnNotFound` for unknown columns and `TypeMismatch`
    /// for ill-typed operations; nothing is evaluated.
    pub fn resolve_type(&self, schema: &Schema) -> Result<ColumnType> {
        Ok(self.infer(schema)?.unwrap_or(ColumnType::Boolean))
    }

    pub(crate) fn infer(&self, schema: &Schema) -> Result<Inferred> {
        self.infer_in(schema, false)
    }

    fn infer_in(&self, schema: &Schema, in_aggregate: bool) -> Result<Inferred> {
        match self {
            Expr::Literal(value) => Ok(value.column_type()),
            Expr::Column(name) => schema.column_type(name).map(Some),
            Expr::Unary { op, operand } => {
                let ty = operand.infer_in(schema, in_aggregate)?;
                match op {
                    UnaryOp::Not => {
                        require_boolean("operator !", ty)?;
                        Ok(Some(ColumnType::Boolean))
                    }
                    UnaryOp::Negate => {
                        require_numeric("unary -", ty)?;
                        Ok(ty)
                    }
                }
            }
            Expr::Binary { left, op, right } => {
                let l = left.infer_in(schema, in_aggregate)?;
                let r = right.infer_in(schema, in_aggregate)?;
                let context = format!("operator {}", op.symbol());

                if op.is_logical() {
                    require_boolean(&context, l)?;
                    require_boolean(&context, r)?;
                    return Ok(Some(ColumnType::Boolean));
                }

                if op.is_comparison() {
                    let compatible = match op {
                        BinaryOp::Equal | BinaryOp::NotEqual => equality_compatible(l, r),
                        _ => ordering_compatible(l, r),
                    };
                    if !compatible {
                        return Err(Error::type_mismatch(context, describe(l), describe(r)));
                    }
                    return Ok(Some(ColumnType::Boolean));
                }

                require_numeric(&context, l)?;
                require_numeric(&context, r)?;
                Ok(arithmetic_result(*op, l, r))
            }
            Expr::InSet { expr, set } => {
                let ty = expr.infer_in(schema, in_aggregate)?;
                for value in set {
                    let member = value.column_type();
                    if !equality_compatible(ty, member) {
                        return Err(Error::type_mismatch("%in%", describe(ty), describe(member)));
                    }
                }
                Ok(Some(ColumnType::Boolean))
            }
            Expr::Function { func, args } => {
                let (min, max) = func.arity();
                if args.len() < min || args.len() > max {
                    return Err(Error::InvalidInput(format!(
                        "{}() takes {} argument(s), got {}",
                        func.name(),
                        if min == max {
                            min.to_string()
                        } else {
                            format!("{} to {}", min, max)
                        },
                        args.len()
                    )));
                }

                let types = args
                    .iter()
                    .map(|a| a.infer_in(schema, in_aggregate))
                    .collect::<Result<Vec<_>>>()?;
                function_type(*func, &types)
            }
            Expr::Aggregate { func, arg, .. } => {
                if in_aggregate {
                    return Err(Error::type_mismatch(
                        format!("{}()", func.name()),
                        "scalar argument",
                        "nested aggregate",
                    ));
                }
                let input = match arg {
                    Some(arg) => arg.infer_in(schema, true)?,
                    None => None,
                };
                func.result_type(input, arg.is_some()).map(Some)
            }
        }
    }
}

fn function_type(func: ScalarFunc, types: &[Inferred]) -> Result<Inferred> {
    let context = format!("{}()", func.name());
    match func {
        ScalarFunc::Abs | ScalarFunc::Floor | ScalarFunc::Ceil => {
            require_numeric(&context, types[0])?;
            Ok(types[0])
        }
        ScalarFunc::Round => {
            require_numeric(&context, types[0])?;
            if let Some(digits) = types.get(1) {
                if !matches!(digits, None | Some(ColumnType::Int64)) {
                    return Err(Error::type_mismatch(&context, ColumnType::Int64, describe(*digits)));
                }
            }
            Ok(types[0])
        }
        ScalarFunc::Sqrt | ScalarFunc::Log | ScalarFunc::Log10 | ScalarFunc::Exp => {
            require_numeric(&context, types[0])?;
            Ok(Some(ColumnType::Float64))
        }
        ScalarFunc::IsNa => Ok(Some(ColumnType::Boolean)),
        ScalarFunc::IfElse => {
            require_boolean(&context, types[0])?;
            unify(&context, types[1], types[2])
        }
        ScalarFunc::Between => {
            if !ordering_compatible(types[0], types[1]) || !ordering_compatible(types[0], types[2]) {
                return Err(Error::type_mismatch(
                    &context,
                    describe(types[0]),
                    format!("{} / {}", describe(types[1]), describe(types[2])),
                ));
            }
            Ok(Some(ColumnType::Boolean))
        }
        ScalarFunc::Coalesce => unify(&context, types[0], types[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::Field;
    use crate::expr::{col, if_else, lit, mean, n, null, quantile, sum};

    fn schema() -> Schema {
        Schema::new(vec![
            Field {
                name: "i".into(),
                column_type: ColumnType::Int64,
            },
            Field {
                name: "f".into(),
                column_type: ColumnType::Float64,
            },
            Field {
                name: "s".into(),
                column_type: ColumnType::String,
            },
            Field {
                name: "b".into(),
                column_type: ColumnType::Boolean,
            },
            Field {
                name: "c".into(),
                column_type: ColumnType::Categorical,
            },
        ])
    }

    #[test]
    fn arithmetic_widening() {
        let schema = schema();
        assert_eq!((col("i") + lit(1)).resolve_type(&schema).unwrap(), ColumnType::Int64);
        assert_eq!((col("i") * col("f")).resolve_type(&schema).unwrap(), ColumnType::Float64);
        assert_eq!((col("i") / lit(2)).resolve_type(&schema).unwrap(), ColumnType::Float64);
        assert_eq!((col("i") % lit(2)).resolve_type(&schema).unwrap(), ColumnType::Int64);
    }

    #[test]
    fn string_arithmetic_is_rejected() {
        let err = (col("s") + lit(1)).resolve_type(&schema()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_column() {
        let err = col("nope").gt(lit(1)).resolve_type(&schema()).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(name) if name == "nope"));
    }

    #[test]
    fn comparisons_and_logic() {
        let schema = schema();
        let pred = col("i").gt(lit(1.5)) & col("s").equal(lit("a"));
        assert_eq!(pred.resolve_type(&schema).unwrap(), ColumnType::Boolean);
        assert!(col("b").lt(lit(true)).resolve_type(&schema).is_err());
        assert!(col("s").gt(lit(1)).resolve_type(&schema).is_err());
        assert!(col("c").equal(lit("Fair")).resolve_type(&schema).is_ok());
        assert!((col("i") & col("b")).resolve_type(&schema).is_err());
    }

    #[test]
    fn untyped_missing_unifies() {
        let schema = schema();
        assert_eq!(null().resolve_type(&schema).unwrap(), ColumnType::Boolean);
        assert_eq!((col("f") + null()).resolve_type(&schema).unwrap(), ColumnType::Float64);
        assert_eq!(
            if_else(col("b"), col("i"), null()).resolve_type(&schema).unwrap(),
            ColumnType::Int64
        );
        assert_eq!(
            if_else(col("b"), col("i"), col("f")).resolve_type(&schema).unwrap(),
            ColumnType::Float64
        );
        assert!(if_else(col("b"), col("i"), col("s")).resolve_type(&schema).is_err());
    }

    #[test]
    fn aggregates() {
        let schema = schema();
        assert_eq!(n().resolve_type(&schema).unwrap(), ColumnType::Int64);
        assert_eq!(sum(col("b")).resolve_type(&schema).unwrap(), ColumnType::Int64);
        assert_eq!(sum(col("f")).resolve_type(&schema).unwrap(), ColumnType::Float64);
        assert_eq!(
            (col("i") - mean(col("i"))).resolve_type(&schema).unwrap(),
            ColumnType::Float64
        );
        assert!(mean(col("s")).resolve_type(&schema).is_err());
        assert!(mean(mean(col("i"))).resolve_type(&schema).is_err());
        assert!(matches!(
            quantile(col("f"), 1.5).resolve_type(&schema),
            Err(Error::AggregateDomain(_))
        ));
    }
}
