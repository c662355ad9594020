use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::{
    BooleanColumn, CategoricalColumn, Float64Column, Int64Column, StringColumn, Value,
};
use crate::error::{Error, Result};

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Boolean,
    /// Factor with an explicit level list, optionally ordered
    Categorical,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

/// Operations every typed column provides
pub trait ColumnTrait: Debug + Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column_type(&self) -> ColumnType;

    /// Number of missing slots
    fn null_count(&self) -> usize;

    /// Value at `index`, `Value::Null` when missing
    fn value(&self, index: usize) -> Result<Value>;

    /// New column holding the rows at `indices`, in that order
    fn take(&self, indices: &[usize]) -> Column;
}

/// Bitmask tracking missing slots (set bit = missing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    pub(crate) data: Arc<[u8]>,
    pub(crate) len: usize,
}

impl BitMask {
    /// Build a mask from per-slot flags; `None` when no flag is set
    pub fn from_bools(bools: &[bool]) -> Option<Self> {
        if !bools.iter().any(|&b| b) {
            return None;
        }

        let mut data = vec![0u8; (bools.len() + 7) / 8];
        for (i, &is_set) in bools.iter().enumerate() {
            if is_set {
                data[i / 8] |= 1 << (i % 8);
            }
        }

        Some(Self {
            data: data.into(),
            len: bools.len(),
        })
    }

    /// Check a bit, failing on out-of-range indices
    pub fn get(&self, index: usize) -> Result<bool> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len,
            });
        }
        Ok(self.is_set(index))
    }

    pub(crate) fn is_set(&self, index: usize) -> bool {
        self.data
            .get(index / 8)
            .map_or(false, |byte| byte & (1 << (index % 8)) != 0)
    }

    pub fn count_set(&self) -> usize {
        (0..self.len).filter(|&i| self.is_set(i)).count()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gather the bits at `indices` into a new mask
    pub(crate) fn take(&self, indices: &[usize]) -> Option<Self> {
        let bools: Vec<bool> = indices.iter().map(|&i| self.is_set(i)).collect();
        Self::from_bools(&bools)
    }
}

/// Column helpers shared by the typed implementations
pub(crate) mod utils {
    use super::BitMask;
    use crate::error::{Error, Result};

    pub fn check_len(expected: usize, found: usize) -> Result<()> {
        if expected != found {
            return Err(Error::InconsistentRowCount { expected, found });
        }
        Ok(())
    }

    pub fn check_index(index: usize, size: usize) -> Result<()> {
        if index >= size {
            return Err(Error::IndexOutOfBounds { index, size });
        }
        Ok(())
    }

    pub fn is_null(mask: &Option<BitMask>, index: usize) -> bool {
        mask.as_ref().map_or(false, |m| m.is_set(index))
    }

    pub fn take_mask(mask: &Option<BitMask>, indices: &[usize]) -> Option<BitMask> {
        mask.as_ref().and_then(|m| m.take(indices))
    }

    /// Split optional values into payload and null flags
    pub fn split_options<T: Clone>(values: Vec<Option<T>>, fill: T) -> (Vec<T>, Vec<bool>) {
        let mut data = Vec::with_capacity(values.len());
        let mut nulls = Vec::with_capacity(values.len());
        for value in values {
            nulls.push(value.is_none());
            data.push(value.unwrap_or_else(|| fill.clone()));
        }
        (data, nulls)
    }
}

/// A column of any supported type
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Int64Column),
    Float64(Float64Column),
    String(StringColumn),
    Boolean(BooleanColumn),
    Categorical(CategoricalColumn),
}

impl Column {
    fn inner(&self) -> &dyn ColumnTrait {
        match self {
            Column::Int64(col) => col,
            Column::Float64(col) => col,
            Column::String(col) => col,
            Column::Boolean(col) => col,
            Column::Categorical(col) => col,
        }
    }

    pub fn len(&self) -> usize {
        self.inner().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        self.inner().column_type()
    }

    pub fn null_count(&self) -> usize {
        self.inner().null_count()
    }

    pub fn value(&self, index: usize) -> Result<Value> {
        self.inner().value(index)
    }

    pub fn take(&self, indices: &[usize]) -> Column {
        self.inner().take(indices)
    }

    /// All values in row order
    pub fn values(&self) -> Vec<Value> {
        (0..self.len())
            .map(|i| self.value(i).unwrap_or(Value::Null))
            .collect()
    }

    /// Build a column of type `column_type` from scalar values
    ///
    /// Integers widen into float columns; any other value of the wrong type
    /// is a `TypeMismatch`. Categorical columns take their level set from
    /// the first non-missing factor.
    pub fn from_values(column_type: ColumnType, values: Vec<Value>) -> Result<Column> {
        let mismatch = |v: &Value| {
            Error::type_mismatch(
                "column construction",
                column_type,
                v.column_type().map_or("NA".to_string(), |t| t.to_string()),
            )
        };

        match column_type {
            ColumnType::Int64 => {
                let data = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Int64(i) => Ok(Some(*i)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Int64Column::from_options(data).into())
            }
            ColumnType::Float64 => {
                let data = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Float64(f) => Ok(Some(*f)),
                        Value::Int64(i) => Ok(Some(*i as f64)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Float64Column::from_options(data).into())
            }
            ColumnType::Boolean => {
                let data = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Bool(b) => Ok(Some(*b)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(BooleanColumn::from_options(data).into())
            }
            ColumnType::String => {
                let data = values
                    .into_iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Str(s) => Ok(Some(s)),
                        other => Err(mismatch(&other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(StringColumn::from_options(data).into())
            }
            ColumnType::Categorical => CategoricalColumn::from_factors(values).map(Column::from),
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.column_type() == other.column_type()
            && self.len() == other.len()
            && (0..self.len()).all(|i| self.value(i).ok() == other.value(i).ok())
    }
}

impl From<Int64Column> for Column {
    fn from(col: Int64Column) -> Self {
        Column::Int64(col)
    }
}

impl From<Float64Column> for Column {
    fn from(col: Float64Column) -> Self {
        Column::Float64(col)
    }
}

impl From<StringColumn> for Column {
    fn from(col: StringColumn) -> Self {
        Column::String(col)
    }
}

impl From<BooleanColumn> for Column {
    fn from(col: BooleanColumn) -> Self {
        Column::Boolean(col)
    }
}

impl From<CategoricalColumn> for Column {
    fn from(col: CategoricalColumn) -> Self {
        Column::Categorical(col)
    }
}
