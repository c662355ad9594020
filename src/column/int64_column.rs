use std::sync::Arc;

use crate::column::common::{utils, BitMask, Column, ColumnTrait, ColumnType};
use crate::column::Value;
use crate::error::Result;

/// Column of 64-bit integers
#[derive(Debug, Clone)]
pub struct Int64Column {
    pub(crate) data: Arc<[i64]>,
    pub(crate) null_mask: Option<BitMask>,
}

impl Int64Column {
    /// Create a column with no missing values
    pub fn new(data: Vec<i64>) -> Self {
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    /// Create a column where `nulls[i]` marks slot `i` as missing
    pub fn with_nulls(data: Vec<i64>, nulls: Vec<bool>) -> Result<Self> {
        utils::check_len(data.len(), nulls.len())?;
        Ok(Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<i64>>) -> Self {
        let (data, nulls) = utils::split_options(values, 0);
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        }
    }

    /// Value at `index`, `None` when missing
    pub fn get(&self, index: usize) -> Result<Option<i64>> {
        utils::check_index(index, self.data.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(None);
        }
        Ok(Some(self.data[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<i64>> + '_ {
        self.data.iter().enumerate().map(move |(i, &v)| {
            if utils::is_null(&self.null_mask, i) {
                None
            } else {
                Some(v)
            }
        })
    }
}

impl ColumnTrait for Int64Column {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Int64
    }

    fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_set)
    }

    fn value(&self, index: usize) -> Result<Value> {
        Ok(self.get(index)?.map_or(Value::Null, Value::Int64))
    }

    fn take(&self, indices: &[usize]) -> Column {
        let data: Vec<i64> = indices.iter().map(|&i| self.data[i]).collect();
        Column::Int64(Self {
            data: data.into(),
            null_mask: utils::take_mask(&self.null_mask, indices),
        })
    }
}
