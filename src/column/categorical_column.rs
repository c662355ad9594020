use std::collections::HashSet;
use std::sync::Arc;

use crate::column::common::{utils, BitMask, Column, ColumnTrait, ColumnType};
use crate::column::{Factor, Levels, Value};
use crate::error::{Error, Result};

/// Factor column: integer codes into a shared level list
///
/// When `ordered`, comparisons and sorting follow the level order rather
/// than the label text.
#[derive(Debug, Clone)]
pub struct CategoricalColumn {
    pub(crate) codes: Arc<[u32]>,
    pub(crate) levels: Arc<Levels>,
    pub(crate) null_mask: Option<BitMask>,
}

impl CategoricalColumn {
    /// Create a categorical column
    ///
    /// # Arguments
    /// * `values` - labels, one per row
    /// * `levels` - level order; when `None`, levels are the distinct labels
    ///   in order of first appearance
    /// * `ordered` - whether the level order is meaningful
    pub fn new<S: Into<String>>(
        values: Vec<S>,
        levels: Option<Vec<String>>,
        ordered: bool,
    ) -> Result<Self> {
        Self::from_options(values.into_iter().map(|s| Some(s.into())).collect(), levels, ordered)
    }

    /// Create a categorical column where `None` marks a missing slot
    pub fn from_options(
        values: Vec<Option<String>>,
        levels: Option<Vec<String>>,
        ordered: bool,
    ) -> Result<Self> {
        let labels = match levels {
            Some(labels) => {
                let mut seen = HashSet::with_capacity(labels.len());
                for label in &labels {
                    if !seen.insert(label.as_str()) {
                        return Err(Error::InvalidInput(format!(
                            "Duplicate categorical level '{}'",
                            label
                        )));
                    }
                }
                labels
            }
            None => {
                let mut labels: Vec<String> = Vec::new();
                for value in values.iter().flatten() {
                    if !labels.contains(value) {
                        labels.push(value.clone());
                    }
                }
                labels
            }
        };
        let levels = Levels::new(labels, ordered);

        let mut codes = Vec::with_capacity(values.len());
        let mut nulls = Vec::with_capacity(values.len());
        for value in &values {
            match value {
                Some(label) => {
                    let code = levels.position(label).ok_or_else(|| {
                        Error::InvalidValue(format!("Value '{}' is not a level of the factor", label))
                    })?;
                    codes.push(code);
                    nulls.push(false);
                }
                None => {
                    codes.push(0);
                    nulls.push(true);
                }
            }
        }

        Ok(Self {
            codes: codes.into(),
            levels: Arc::new(levels),
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    /// Rebuild a column from factor values sharing one level set
    pub(crate) fn from_factors(values: Vec<Value>) -> Result<Self> {
        let levels = values
            .iter()
            .find_map(|v| match v {
                Value::Factor(f) => Some(f.levels().clone()),
                _ => None,
            })
            .unwrap_or_else(|| Arc::new(Levels::new(Vec::new(), false)));

        let mut codes = Vec::with_capacity(values.len());
        let mut nulls = Vec::with_capacity(values.len());
        for value in &values {
            match value {
                Value::Null => {
                    codes.push(0);
                    nulls.push(true);
                }
                Value::Factor(f) if Arc::ptr_eq(f.levels(), &levels) || f.levels() == &levels => {
                    codes.push(f.code());
                    nulls.push(false);
                }
                Value::Factor(_) => {
                    return Err(Error::type_mismatch(
                        "categorical column",
                        "factors with one level set",
                        "factors with differing levels",
                    ))
                }
                other => {
                    return Err(Error::type_mismatch(
                        "categorical column",
                        ColumnType::Categorical,
                        other.column_type().map_or("NA".to_string(), |t| t.to_string()),
                    ))
                }
            }
        }

        Ok(Self {
            codes: codes.into(),
            levels,
            null_mask: BitMask::from_bools(&nulls),
        })
    }

    pub fn levels(&self) -> &Arc<Levels> {
        &self.levels
    }

    pub fn is_ordered(&self) -> bool {
        self.levels.is_ordered()
    }

    /// Label at `index`, `None` when missing
    pub fn get(&self, index: usize) -> Result<Option<&str>> {
        utils::check_index(index, self.codes.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(None);
        }
        Ok(self.levels.label(self.codes[index]))
    }
}

impl ColumnTrait for CategoricalColumn {
    fn len(&self) -> usize {
        self.codes.len()
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Categorical
    }

    fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_set)
    }

    fn value(&self, index: usize) -> Result<Value> {
        utils::check_index(index, self.codes.len())?;
        if utils::is_null(&self.null_mask, index) {
            return Ok(Value::Null);
        }
        Ok(Value::Factor(Factor::new(self.codes[index], self.levels.clone())))
    }

    fn take(&self, indices: &[usize]) -> Column {
        let codes: Vec<u32> = indices.iter().map(|&i| self.codes[i]).collect();
        Column::Categorical(Self {
            codes: codes.into(),
            levels: self.levels.clone(),
            null_mask: utils::take_mask(&self.null_mask, indices),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_default_to_first_appearance() {
        let col = CategoricalColumn::new(vec!["b", "a", "b"], None, false).unwrap();
        assert_eq!(col.levels().labels(), &["b".to_string(), "a".to_string()]);
        assert_eq!(col.get(1).unwrap(), Some("a"));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = CategoricalColumn::new(vec!["Fair", "Poor"], Some(vec!["Fair".to_string()]), true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn take_keeps_level_set() {
        let col = CategoricalColumn::from_options(
            vec![Some("Good".into()), None, Some("Fair".into())],
            Some(vec!["Fair".into(), "Good".into()]),
            true,
        )
        .unwrap();
        let taken = col.take(&[2, 1]);
        assert_eq!(taken.null_count(), 1);
        match taken.value(0).unwrap() {
            Value::Factor(f) => {
                assert_eq!(f.label(), "Fair");
                assert!(f.levels().is_ordered());
            }
            other => panic!("expected factor, got {:?}", other),
        }
    }
}
