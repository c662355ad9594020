use std::sync::Arc;

use crate::column::common::{utils, BitMask, Column, ColumnTrait, ColumnType};
use crate::column::Value;
use crate::error::Result;
use crate::na::{Logical, NA};

/// Column of booleans, missing slots make it three-valued
#[derive(Debug, Clone)]
pub struct BooleanColumn {
    pub(crate) data: Arc<[bool]>,
    pub(crate) null_mask: Option<BitMask>,
}

impl BooleanColumn {
    pub fn new(data: Vec<bool>) -> Self {
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    pub fn with_nulls(data: Vec<bool>, nulls: Vec<bool>) -> Result<Self> {
        utils::check_len(data.len(), nulls.len())?;
        Ok(Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<bool>>) -> Self {
        let (data, nulls) = utils::split_options(values, false);
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        }
    }

    /// Build a column from a three-valued mask
    pub fn from_logical(mask: &[Logical]) -> Self {
        Self::from_options(mask.iter().map(|&l| l.into()).collect())
    }

    pub fn get(&self, index: usize) -> Result<Option<bool>> {
        utils::check_index(index, self.data.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(None);
        }
        Ok(Some(self.data[index]))
    }

    /// Three-valued view of every slot
    pub fn to_logical(&self) -> Vec<Logical> {
        (0..self.data.len())
            .map(|i| {
                if utils::is_null(&self.null_mask, i) {
                    NA::NA
                } else {
                    NA::Value(self.data[i])
                }
            })
            .collect()
    }

    /// Number of slots that are known and true
    pub fn count_true(&self) -> usize {
        self.to_logical().iter().filter(|l| l.is_true()).count()
    }
}

impl ColumnTrait for BooleanColumn {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Boolean
    }

    fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_set)
    }

    fn value(&self, index: usize) -> Result<Value> {
        Ok(self.get(index)?.map_or(Value::Null, Value::Bool))
    }

    fn take(&self, indices: &[usize]) -> Column {
        let data: Vec<bool> = indices.iter().map(|&i| self.data[i]).collect();
        Column::Boolean(Self {
            data: data.into(),
            null_mask: utils::take_mask(&self.null_mask, indices),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_round_trip_keeps_missing() {
        let mask = vec![NA::Value(true), NA::NA, NA::Value(false)];
        let col = BooleanColumn::from_logical(&mask);
        assert_eq!(col.to_logical(), mask);
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.count_true(), 1);
        assert_eq!(col.get(1).unwrap(), None);
    }
}
