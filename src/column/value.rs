//! Scalar values flowing through expressions and aggregates

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::ColumnType;
use crate::na::{Logical, NA};

/// Level set of a categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levels {
    labels: Vec<String>,
    ordered: bool,
}

impl Levels {
    pub fn new(labels: Vec<String>, ordered: bool) -> Self {
        Self { labels, ordered }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of a label in the level order
    pub fn position(&self, label: &str) -> Option<u32> {
        self.labels.iter().position(|l| l == label).map(|p| p as u32)
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }
}

/// One value of a categorical column: a level code plus its level set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    code: u32,
    levels: Arc<Levels>,
}

impl Factor {
    pub fn new(code: u32, levels: Arc<Levels>) -> Self {
        Self { code, levels }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn levels(&self) -> &Arc<Levels> {
        &self.levels
    }

    pub fn label(&self) -> &str {
        self.levels.label(self.code).unwrap_or("")
    }

    /// Whether two factors share the same level set
    pub fn same_levels(&self, other: &Factor) -> bool {
        Arc::ptr_eq(&self.levels, &other.levels) || self.levels == other.levels
    }
}

/// Scalar value, with `Null` as the missing-value marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Str(String),
    Factor(Factor),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Column type this value belongs to; `None` for `Null`
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Float64(_) => Some(ColumnType::Float64),
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Str(_) => Some(ColumnType::String),
            Value::Factor(_) => Some(ColumnType::Categorical),
        }
    }

    /// Numeric view (booleans count as 0/1)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view of strings and factor labels
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Factor(f) => Some(f.label()),
            _ => None,
        }
    }

    /// Ordering used by `arrange`: values of one column compared with each
    /// other, missing values last
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Factor(a), Value::Factor(b)) => a.code.cmp(&b.code),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Factor(a), Value::Factor(b)) => a.label() == b.label(),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NA"),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Factor(v) => write!(f, "{}", v.label()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Logical> for Value {
    fn from(v: Logical) -> Self {
        match v {
            NA::Value(b) => Value::Bool(b),
            NA::NA => Value::Null,
        }
    }
}
