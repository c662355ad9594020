//! tidyframe: a small in-memory DataFrame engine
//!
//! Columns are typed and carry a missing-value mask. Row predicates use
//! three-valued logic, so a comparison against a missing value is itself
//! missing and `filter` drops that row. Verbs (`filter`, `mutate`,
//! `select`, `rename`, `arrange`, `group_by`, `summarise`, `count`) borrow
//! their input and return a new DataFrame, and a [`Pipeline`] chains them
//! with fail-fast error propagation.
//!
//! ```
//! use tidyframe::{col, lit, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_int_column("x", vec![0, 3, 4]).unwrap();
//! df.add_int_column("y", vec![5, 3, 0]).unwrap();
//!
//! let out = df.filter([col("x").gt(lit(0)), col("y").gt(lit(0))]).unwrap();
//! assert_eq!(out.row_count(), 1);
//! ```

#![allow(clippy::new_without_default)]
#![allow(clippy::should_implement_trait)]

pub mod column;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod expr;
pub mod groupby;
pub mod na;
pub mod pipeline;

// Re-export commonly used types
pub use column::{Column, ColumnType, Value};
pub use config::{DisplayConfig, EngineConfig};
pub use dataframe::{DataFrame, Schema, SortKey};
pub use error::{Error, Result};
pub use expr::{
    coalesce, col, count_true, first, if_else, last, lit, max, mean, median, min, n, n_distinct,
    null, parse, quantile, sd, sum, Expr,
};
pub use groupby::{AggFunc, GroupedFrame};
pub use na::{Logical, NA};
pub use pipeline::{execute_all, pipeline, Operation, Pipeline};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
