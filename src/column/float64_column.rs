use std::sync::Arc;

use crate::column::common::{utils, BitMask, Column, ColumnTrait, ColumnType};
use crate::column::Value;
use crate::error::Result;

/// Column of 64-bit floats
///
/// `NaN` is an ordinary float value here; missing slots are tracked by the
/// null mask only.
#[derive(Debug, Clone)]
pub struct Float64Column {
    pub(crate) data: Arc<[f64]>,
    pub(crate) null_mask: Option<BitMask>,
}

impl Float64Column {
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    pub fn with_nulls(data: Vec<f64>, nulls: Vec<bool>) -> Result<Self> {
        utils::check_len(data.len(), nulls.len())?;
        Ok(Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        let (data, nulls) = utils::split_options(values, 0.0);
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<f64>> {
        utils::check_index(index, self.data.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(None);
        }
        Ok(Some(self.data[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.data.iter().enumerate().map(move |(i, &v)| {
            if utils::is_null(&self.null_mask, i) {
                None
            } else {
                Some(v)
            }
        })
    }
}

impl ColumnTrait for Float64Column {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Float64
    }

    fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_set)
    }

    fn value(&self, index: usize) -> Result<Value> {
        Ok(self.get(index)?.map_or(Value::Null, Value::Float64))
    }

    fn take(&self, indices: &[usize]) -> Column {
        let data: Vec<f64> = indices.iter().map(|&i| self.data[i]).collect();
        Column::Float64(Self {
            data: data.into(),
            null_mask: utils::take_mask(&self.null_mask, indices),
        })
    }
}
