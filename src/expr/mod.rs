//! Typed expression tree
//!
//! Expressions reference columns by name and are checked against a
//! [`Schema`](crate::dataframe::Schema) before any row is evaluated, so an
//! unknown column or an ill-typed operation fails up front.
//!
//! Expressions can be built in code:
//!
//! ```
//! use tidyframe::expr::{col, lit, mean};
//!
//! let predicate = col("x").gt(lit(0)) & col("y").gt(lit(0));
//! let size = (col("x") + col("y")) / lit(2);
//! let avg = mean(col("v")).na_rm();
//! # let _ = (predicate, size, avg);
//! ```
//!
//! or parsed from text with [`parse`].

mod eval;
mod parser;
mod types;

use std::fmt::{self, Display};
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub};

use crate::column::Value;
use crate::groupby::AggFunc;

pub use eval::{Datum, Evaluator};
pub(crate) use eval::check_predicates;
pub use parser::{parse, parse_named, Lexer, Parser, Token};

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Column reference
    Column(String),
    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Set membership test (`x %in% c(...)`)
    InSet { expr: Box<Expr>, set: Vec<Value> },
    /// Vectorised scalar function
    Function { func: ScalarFunc, args: Vec<Expr> },
    /// Reduction over the current group (or the whole store)
    Aggregate {
        func: AggFunc,
        arg: Option<Box<Expr>>,
        na_rm: bool,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

/// Row-wise functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunc {
    Abs,
    Sqrt,
    Log,
    Log10,
    Exp,
    /// `round(x)` or `round(x, digits)`
    Round,
    Floor,
    Ceil,
    /// Missingness test; never missing itself
    IsNa,
    /// `if_else(cond, yes, no)`
    IfElse,
    /// Inclusive range test `between(x, lo, hi)`
    Between,
    /// First non-missing of two values
    Coalesce,
}

impl ScalarFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "abs" => ScalarFunc::Abs,
            "sqrt" => ScalarFunc::Sqrt,
            "log" => ScalarFunc::Log,
            "log10" => ScalarFunc::Log10,
            "exp" => ScalarFunc::Exp,
            "round" => ScalarFunc::Round,
            "floor" => ScalarFunc::Floor,
            "ceil" | "ceiling" => ScalarFunc::Ceil,
            "is_na" | "is.na" => ScalarFunc::IsNa,
            "if_else" | "ifelse" => ScalarFunc::IfElse,
            "between" => ScalarFunc::Between,
            "coalesce" => ScalarFunc::Coalesce,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunc::Abs => "abs",
            ScalarFunc::Sqrt => "sqrt",
            ScalarFunc::Log => "log",
            ScalarFunc::Log10 => "log10",
            ScalarFunc::Exp => "exp",
            ScalarFunc::Round => "round",
            ScalarFunc::Floor => "floor",
            ScalarFunc::Ceil => "ceil",
            ScalarFunc::IsNa => "is_na",
            ScalarFunc::IfElse => "if_else",
            ScalarFunc::Between => "between",
            ScalarFunc::Coalesce => "coalesce",
        }
    }

    /// Accepted argument counts (min, max)
    pub fn arity(&self) -> (usize, usize) {
        match self {
            ScalarFunc::Round => (1, 2),
            ScalarFunc::IfElse | ScalarFunc::Between => (3, 3),
            ScalarFunc::Coalesce => (2, 2),
            _ => (1, 1),
        }
    }
}

/// Reference a column
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Literal value
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Missing literal
pub fn null() -> Expr {
    Expr::Literal(Value::Null)
}

fn aggregate(func: AggFunc, arg: Expr) -> Expr {
    Expr::Aggregate {
        func,
        arg: Some(Box::new(arg)),
        na_rm: false,
    }
}

/// Number of rows in the group
pub fn n() -> Expr {
    Expr::Aggregate {
        func: AggFunc::Count,
        arg: None,
        na_rm: false,
    }
}

pub fn n_distinct(arg: Expr) -> Expr {
    aggregate(AggFunc::CountDistinct, arg)
}

pub fn mean(arg: Expr) -> Expr {
    aggregate(AggFunc::Mean, arg)
}

pub fn median(arg: Expr) -> Expr {
    aggregate(AggFunc::Median, arg)
}

/// Quantile `p` of `arg`, `p` in `[0, 1]`
pub fn quantile(arg: Expr, p: f64) -> Expr {
    aggregate(AggFunc::Quantile(p), arg)
}

pub fn sum(arg: Expr) -> Expr {
    aggregate(AggFunc::Sum, arg)
}

/// Number of rows where a boolean expression is true
pub fn count_true(arg: Expr) -> Expr {
    aggregate(AggFunc::CountTrue, arg)
}

pub fn min(arg: Expr) -> Expr {
    aggregate(AggFunc::Min, arg)
}

pub fn max(arg: Expr) -> Expr {
    aggregate(AggFunc::Max, arg)
}

/// Sample standard deviation
pub fn sd(arg: Expr) -> Expr {
    aggregate(AggFunc::Sd, arg)
}

pub fn first(arg: Expr) -> Expr {
    aggregate(AggFunc::First, arg)
}

pub fn last(arg: Expr) -> Expr {
    aggregate(AggFunc::Last, arg)
}

pub fn if_else(condition: Expr, yes: Expr, no: Expr) -> Expr {
    Expr::Function {
        func: ScalarFunc::IfElse,
        args: vec![condition, yes, no],
    }
}

pub fn coalesce(first: Expr, second: Expr) -> Expr {
    Expr::Function {
        func: ScalarFunc::Coalesce,
        args: vec![first, second],
    }
}

impl Expr {
    fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    fn call(self, func: ScalarFunc) -> Expr {
        Expr::Function {
            func,
            args: vec![self],
        }
    }

    pub fn equal(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Equal, other)
    }

    pub fn not_equal(self, other: Expr) -> Expr {
        self.binary(BinaryOp::NotEqual, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::LessThan, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::LessThanOrEqual, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::GreaterThan, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::GreaterThanOrEqual, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    pub fn pow(self, exponent: Expr) -> Expr {
        self.binary(BinaryOp::Power, exponent)
    }

    /// Membership test against a set of literals
    pub fn is_in<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::InSet {
            expr: Box::new(self),
            set: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_na(self) -> Expr {
        self.call(ScalarFunc::IsNa)
    }

    pub fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::Function {
            func: ScalarFunc::Between,
            args: vec![self, low, high],
        }
    }

    pub fn abs(self) -> Expr {
        self.call(ScalarFunc::Abs)
    }

    pub fn sqrt(self) -> Expr {
        self.call(ScalarFunc::Sqrt)
    }

    pub fn log(self) -> Expr {
        self.call(ScalarFunc::Log)
    }

    pub fn round(self, digits: i64) -> Expr {
        Expr::Function {
            func: ScalarFunc::Round,
            args: vec![self, lit(digits)],
        }
    }

    /// Drop missing values before aggregating
    ///
    /// Only affects aggregate nodes; other expressions are returned as-is.
    pub fn na_rm(self) -> Expr {
        match self {
            Expr::Aggregate { func, arg, .. } => Expr::Aggregate {
                func,
                arg,
                na_rm: true,
            },
            other => other,
        }
    }

    /// Whether a column is referenced outside of any aggregate
    pub fn has_bare_column(&self) -> bool {
        match self {
            Expr::Column(_) => true,
            Expr::Literal(_) | Expr::Aggregate { .. } => false,
            Expr::Unary { operand, .. } => operand.has_bare_column(),
            Expr::Binary { left, right, .. } => left.has_bare_column() || right.has_bare_column(),
            Expr::InSet { expr, .. } => expr.has_bare_column(),
            Expr::Function { args, .. } => args.iter().any(Expr::has_bare_column),
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) => false,
            Expr::Unary { operand, .. } => operand.contains_aggregate(),
            Expr::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::InSet { expr, .. } => expr.contains_aggregate(),
            Expr::Function { args, .. } => args.iter().any(Expr::contains_aggregate),
        }
    }

    /// Names of all referenced columns, in first-seen order
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns(&self, names: &mut Vec<String>) {
        match self {
            Expr::Column(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expr::Literal(_) => {}
            Expr::Unary { operand, .. } => operand.collect_columns(names),
            Expr::Binary { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Expr::InSet { expr, .. } => expr.collect_columns(names),
            Expr::Function { args, .. } => args.iter().for_each(|a| a.collect_columns(names)),
            Expr::Aggregate { arg, .. } => {
                if let Some(arg) = arg {
                    arg.collect_columns(names);
                }
            }
        }
    }
}

fn fmt_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "\"{}\"", s),
        Value::Factor(v) => write!(f, "\"{}\"", v.label()),
        other => write!(f, "{}", other),
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => fmt_literal(value, f),
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!({})", operand),
                UnaryOp::Negate => write!(f, "-({})", operand),
            },
            Expr::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::InSet { expr, set } => {
                write!(f, "{} %in% c(", expr)?;
                for (i, value) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_literal(value, f)?;
                }
                write!(f, ")")
            }
            Expr::Function { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Aggregate { func, arg, na_rm } => {
                write!(f, "{}(", func.name())?;
                if let Some(arg) = arg {
                    write!(f, "{}", arg)?;
                }
                if let AggFunc::Quantile(p) = func {
                    write!(f, ", {}", p)?;
                }
                if *na_rm {
                    write!(f, ", na_rm = true")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Subtract, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Multiply, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Divide, rhs)
    }
}

impl Rem for Expr {
    type Output = Expr;

    fn rem(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Modulo, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_columns_outside_aggregates() {
        assert!(col("x").has_bare_column());
        assert!(!mean(col("x")).has_bare_column());
        assert!(!(sum(col("x")) / n()).has_bare_column());
        assert!((col("x") - mean(col("x"))).has_bare_column());
    }

    #[test]
    fn na_rm_only_marks_aggregates() {
        assert_eq!(
            mean(col("v")).na_rm(),
            Expr::Aggregate {
                func: AggFunc::Mean,
                arg: Some(Box::new(col("v"))),
                na_rm: true
            }
        );
        assert_eq!(col("v").na_rm(), col("v"));
    }

    #[test]
    fn display_is_readable() {
        let expr = col("x").gt(lit(0)) & col("dest").is_in(["IAH", "HOU"]);
        assert_eq!(expr.to_string(), "((x > 0) && dest %in% c(\"IAH\", \"HOU\"))");
        assert_eq!(quantile(col("v"), 0.25).na_rm().to_string(), "quantile(v, 0.25, na_rm = true)");
    }

    #[test]
    fn referenced_columns_are_unique() {
        let expr = (col("x") + col("y")) / col("x");
        assert_eq!(expr.referenced_columns(), vec!["x".to_string(), "y".to_string()]);
    }
}
