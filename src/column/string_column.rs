use std::sync::Arc;

use crate::column::common::{utils, BitMask, Column, ColumnTrait, ColumnType};
use crate::column::Value;
use crate::error::Result;

/// Column of text values
#[derive(Debug, Clone)]
pub struct StringColumn {
    pub(crate) data: Arc<[String]>,
    pub(crate) null_mask: Option<BitMask>,
}

impl StringColumn {
    pub fn new<S: Into<String>>(data: Vec<S>) -> Self {
        let data: Vec<String> = data.into_iter().map(Into::into).collect();
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    pub fn with_nulls(data: Vec<String>, nulls: Vec<bool>) -> Result<Self> {
        utils::check_len(data.len(), nulls.len())?;
        Ok(Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<String>>) -> Self {
        let (data, nulls) = utils::split_options(values, String::new());
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools(&nulls),
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<&str>> {
        utils::check_index(index, self.data.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(None);
        }
        Ok(Some(self.data[index].as_str()))
    }
}

impl ColumnTrait for StringColumn {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::String
    }

    fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_set)
    }

    fn value(&self, index: usize) -> Result<Value> {
        Ok(self
            .get(index)?
            .map_or(Value::Null, |s| Value::Str(s.to_string())))
    }

    fn take(&self, indices: &[usize]) -> Column {
        let data: Vec<String> = indices.iter().map(|&i| self.data[i].clone()).collect();
        Column::String(Self {
            data: data.into(),
            null_mask: utils::take_mask(&self.null_mask, indices),
        })
    }
}
