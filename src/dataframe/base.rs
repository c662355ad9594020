//! Column store: named, equal-length, typed columns

use std::collections::HashMap;
use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

use crate::column::{
    BooleanColumn, CategoricalColumn, Column, ColumnType, Float64Column, Int64Column,
    StringColumn, Value,
};
use crate::config::DisplayConfig;
use crate::error::{Error, Result};

/// One named, typed field of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered list of column names and types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Type of the named column
    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.column_type)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }
}

/// Column-oriented table
///
/// Columns are reference counted, so cloning a DataFrame is cheap and every
/// verb returns a new DataFrame rather than modifying its input.
#[derive(Clone, Default)]
pub struct DataFrame {
    pub(crate) columns: Vec<Column>,
    pub(crate) column_names: Vec<String>,
    pub(crate) column_indices: HashMap<String, usize>,
    pub(crate) row_count: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a DataFrame from named columns
    ///
    /// Fails with `InconsistentRowCount` when the columns differ in length
    /// and with `DuplicateColumnName` when a name repeats.
    pub fn from_columns<S, C, I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<Column>,
    {
        let mut df = Self::new();
        for (name, column) in columns {
            df.add_column(name, column)?;
        }
        Ok(df)
    }

    /// Append a column
    pub fn add_column<C: Into<Column>>(&mut self, name: impl Into<String>, column: C) -> Result<()> {
        let name = name.into();
        let column = column.into();

        if self.column_indices.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }

        self.column_indices.insert(name.clone(), self.columns.len());
        self.columns.push(column);
        self.column_names.push(name);
        Ok(())
    }

    pub fn add_int_column(&mut self, name: impl Into<String>, data: Vec<i64>) -> Result<()> {
        self.add_column(name, Int64Column::new(data))
    }

    pub fn add_float_column(&mut self, name: impl Into<String>, data: Vec<f64>) -> Result<()> {
        self.add_column(name, Float64Column::new(data))
    }

    pub fn add_string_column<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        data: Vec<S>,
    ) -> Result<()> {
        self.add_column(name, StringColumn::new(data))
    }

    pub fn add_boolean_column(&mut self, name: impl Into<String>, data: Vec<bool>) -> Result<()> {
        self.add_column(name, BooleanColumn::new(data))
    }

    /// Append a factor column with an explicit level order
    pub fn add_categorical_column<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        data: Vec<S>,
        levels: Vec<String>,
        ordered: bool,
    ) -> Result<()> {
        self.add_column(name, CategoricalColumn::new(data, Some(levels), ordered)?)
    }

    /// Append a column built from scalar values of a given type
    pub fn add_values(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<()> {
        self.add_column(name, Column::from_values(column_type, values)?)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    /// Borrow a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_indices
            .get(name)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.column_names
                .iter()
                .zip(&self.columns)
                .map(|(name, col)| Field {
                    name: name.clone(),
                    column_type: col.column_type(),
                })
                .collect(),
        )
    }

    /// Value at (`row`, `column`)
    pub fn value(&self, row: usize, column: &str) -> Result<Value> {
        self.column(column)?.value(row)
    }

    /// All values of one row, in column order
    pub fn row(&self, row: usize) -> Result<Vec<Value>> {
        if row >= self.row_count {
            return Err(Error::IndexOutOfBounds {
                index: row,
                size: self.row_count,
            });
        }
        self.columns.iter().map(|col| col.value(row)).collect()
    }

    /// New DataFrame holding the rows at `indices`, in that order
    pub fn take_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.row_count) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: self.row_count,
            });
        }

        Ok(Self {
            columns: self.columns.iter().map(|col| col.take(indices)).collect(),
            column_names: self.column_names.clone(),
            column_indices: self.column_indices.clone(),
            row_count: indices.len(),
        })
    }

    /// Return a copy with `name` replaced in place, or appended when new
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }

        let mut result = self.clone();
        match result.column_indices.get(&name) {
            Some(&idx) => result.columns[idx] = column,
            None => result.add_column(name, column)?,
        }
        Ok(result)
    }

    /// Render as a text table using `config`
    pub fn display_with(&self, config: &DisplayConfig) -> String {
        let mut out = String::new();
        if self.columns.is_empty() {
            out.push_str("DataFrame (0 rows x 0 columns)");
            return out;
        }

        let width = config.column_width;
        out.push_str(&format!(
            "DataFrame ({} rows x {} columns):\n",
            self.row_count,
            self.columns.len()
        ));

        out.push_str(&format!("{:<5} |", "idx"));
        for (name, col) in self.column_names.iter().zip(&self.columns) {
            let header = format!("{} <{}>", name, col.column_type());
            out.push_str(&format!(" {:<width$} |", header, width = width));
        }
        out.push('\n');

        out.push_str(&format!("{:-<5}-+", ""));
        for _ in &self.columns {
            out.push_str(&format!("-{:-<width$}-+", "", width = width));
        }
        out.push('\n');

        let shown = self.row_count.min(config.max_rows);
        for row in 0..shown {
            out.push_str(&format!("{:<5} |", row));
            for col in &self.columns {
                let cell = match col.value(row) {
                    Ok(Value::Null) | Err(_) => config.na_repr.clone(),
                    Ok(Value::Float64(v)) => format!("{:.*}", config.float_precision, v),
                    Ok(Value::Str(s)) => format!("\"{}\"", s),
                    Ok(other) => other.to_string(),
                };
                out.push_str(&format!(" {:<width$} |", cell, width = width));
            }
            out.push('\n');
        }

        if self.row_count > shown {
            out.push_str(&format!("... ({} more rows)\n", self.row_count - shown));
        }
        out
    }
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.row_count == other.row_count
            && self.column_names == other.column_names
            && self.columns == other.columns
    }
}

impl Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with(&DisplayConfig::default()))
    }
}

impl Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_int_column("x", vec![1, 2, 3]).unwrap();
        df.add_string_column("name", vec!["a", "b", "c"]).unwrap();
        df
    }

    #[test]
    fn add_column_checks_shape() {
        let mut df = sample();
        let err = df.add_float_column("y", vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentRowCount {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn add_column_rejects_duplicates() {
        let mut df = sample();
        let err = df.add_int_column("x", vec![0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumnName(name) if name == "x"));
    }

    #[test]
    fn take_rows_reorders() {
        let df = sample().take_rows(&[2, 0]).unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.value(0, "name").unwrap(), Value::Str("c".into()));
        assert_eq!(df.value(1, "x").unwrap(), Value::Int64(1));
        assert!(sample().take_rows(&[3]).is_err());
    }

    #[test]
    fn with_column_replaces_in_place() {
        let df = sample();
        let replaced = df
            .with_column("x", Float64Column::new(vec![0.5, 1.5, 2.5]).into())
            .unwrap();
        assert_eq!(replaced.column_names(), df.column_names());
        assert_eq!(replaced.schema().column_type("x").unwrap(), ColumnType::Float64);
        // the input is untouched
        assert_eq!(df.schema().column_type("x").unwrap(), ColumnType::Int64);
    }

    #[test]
    fn display_truncates_rows() {
        let config = DisplayConfig {
            max_rows: 1,
            ..DisplayConfig::default()
        };
        let text = sample().display_with(&config);
        assert!(text.starts_with("DataFrame (3 rows x 2 columns):"));
        assert!(text.contains("... (2 more rows)"));
    }
}
