//! Pipeline composition
//!
//! A [`Pipeline`] records operations against a source DataFrame and runs
//! them in one pass on [`execute`](Pipeline::execute). Each step consumes
//! the previous step's output; the first error stops the run and is
//! returned unchanged.
//!
//! ```
//! use tidyframe::{col, lit, mean, DataFrame, Pipeline};
//!
//! let mut df = DataFrame::new();
//! df.add_string_column("c", vec!["A", "B", "A"]).unwrap();
//! df.add_int_column("v", vec![10, 20, 30]).unwrap();
//!
//! let out = Pipeline::new(df)
//!     .filter(col("v").gt(lit(5)))
//!     .group_by(["c"])
//!     .summarise([("m", mean(col("v")))])
//!     .execute()
//!     .unwrap();
//! assert_eq!(out.row_count(), 2);
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::dataframe::{DataFrame, SortKey};
use crate::error::Result;
use crate::expr::{n, parse, parse_named, Expr};
use crate::groupby::GroupedFrame;

/// Custom step over a whole DataFrame
pub type MapFn = Arc<dyn Fn(&DataFrame) -> Result<DataFrame> + Send + Sync>;

/// One recorded pipeline step
#[derive(Clone)]
pub enum Operation {
    /// Keep rows where every predicate is true
    Filter(Vec<Expr>),
    /// Add or replace columns
    Mutate(Vec<(String, Expr)>),
    /// Keep and reorder columns
    Select(Vec<String>),
    /// Rename columns (old, new)
    Rename(Vec<(String, String)>),
    /// Stable multi-key sort
    Arrange(Vec<SortKey>),
    /// Group by key columns
    GroupBy(Vec<String>),
    /// Drop the grouping
    Ungroup,
    /// One row per group
    Summarise(Vec<(String, Expr)>),
    /// Row count per key combination
    Count(Vec<String>),
    /// Custom function
    Map(MapFn),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Filter(_) => "filter",
            Operation::Mutate(_) => "mutate",
            Operation::Select(_) => "select",
            Operation::Rename(_) => "rename",
            Operation::Arrange(_) => "arrange",
            Operation::GroupBy(_) => "group_by",
            Operation::Ungroup => "ungroup",
            Operation::Summarise(_) => "summarise",
            Operation::Count(_) => "count",
            Operation::Map(_) => "map",
        }
    }
}

fn join_exprs(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_named(exprs: &[(String, Expr)]) -> String {
    exprs
        .iter()
        .map(|(name, expr)| format!("{} = {}", name, expr))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Filter(predicates) => write!(f, "Filter({})", join_exprs(predicates)),
            Operation::Mutate(exprs) => write!(f, "Mutate({})", join_named(exprs)),
            Operation::Select(columns) => write!(f, "Select({})", columns.join(", ")),
            Operation::Rename(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(old, new)| format!("{} -> {}", old, new))
                    .collect();
                write!(f, "Rename({})", pairs.join(", "))
            }
            Operation::Arrange(keys) => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!("{} {}", k.column, if k.descending { "desc" } else { "asc" })
                    })
                    .collect();
                write!(f, "Arrange({})", keys.join(", "))
            }
            Operation::GroupBy(keys) => write!(f, "GroupBy({})", keys.join(", ")),
            Operation::Ungroup => write!(f, "Ungroup"),
            Operation::Summarise(exprs) => write!(f, "Summarise({})", join_named(exprs)),
            Operation::Count(keys) => write!(f, "Count({})", keys.join(", ")),
            Operation::Map(_) => write!(f, "Map(...)"),
        }
    }
}

/// Value threaded between steps
#[derive(Debug, Clone)]
pub enum Stage {
    Frame(DataFrame),
    Grouped(GroupedFrame),
}

impl Stage {
    pub fn row_count(&self) -> usize {
        match self {
            Stage::Frame(df) => df.row_count(),
            Stage::Grouped(grouped) => grouped.frame().row_count(),
        }
    }

    /// The DataFrame, dropping any grouping
    pub fn into_frame(self) -> DataFrame {
        match self {
            Stage::Frame(df) => df,
            Stage::Grouped(grouped) => grouped.ungroup(),
        }
    }

    /// Apply one operation
    pub fn apply(self, op: &Operation) -> Result<Stage> {
        match (self, op) {
            (Stage::Frame(df), Operation::Filter(predicates)) => {
                df.filter(predicates.iter().cloned()).map(Stage::Frame)
            }
            (Stage::Grouped(grouped), Operation::Filter(predicates)) => {
                grouped.filter(predicates.iter().cloned()).map(Stage::Grouped)
            }
            (Stage::Frame(df), Operation::Mutate(exprs)) => {
                df.mutate(exprs.iter().cloned()).map(Stage::Frame)
            }
            (Stage::Grouped(grouped), Operation::Mutate(exprs)) => {
                grouped.mutate(exprs.iter().cloned()).map(Stage::Frame)
            }
            (Stage::Frame(df), Operation::Summarise(exprs)) => {
                df.summarise(exprs.iter().cloned()).map(Stage::Frame)
            }
            (Stage::Grouped(grouped), Operation::Summarise(exprs)) => {
                grouped.summarise(exprs.iter().cloned()).map(Stage::Frame)
            }
            (Stage::Grouped(grouped), Operation::Select(columns)) => {
                grouped.select(columns).map(Stage::Grouped)
            }
            (Stage::Grouped(grouped), Operation::Rename(pairs)) => grouped
                .rename(pairs.iter().map(|(old, new)| (old.as_str(), new.clone())))
                .map(Stage::Grouped),
            (Stage::Grouped(grouped), Operation::Arrange(keys)) => {
                grouped.arrange(keys.iter().cloned()).map(Stage::Grouped)
            }
            // regrouping replaces the previous keys
            (stage, Operation::GroupBy(keys)) => {
                stage.into_frame().group_by(keys).map(Stage::Grouped)
            }
            (stage, Operation::Ungroup) => Ok(Stage::Frame(stage.into_frame())),
            (stage, Operation::Count(keys)) => {
                let mut all_keys: Vec<String> = match &stage {
                    Stage::Grouped(grouped) => grouped.keys().to_vec(),
                    Stage::Frame(_) => Vec::new(),
                };
                for key in keys {
                    if !all_keys.contains(key) {
                        all_keys.push(key.clone());
                    }
                }
                let df = stage.into_frame();
                if all_keys.is_empty() {
                    df.summarise([("n", n())]).map(Stage::Frame)
                } else {
                    df.count(&all_keys).map(Stage::Frame)
                }
            }
            (stage, op) => {
                if let Stage::Grouped(grouped) = &stage {
                    debug!("{} drops grouping by {:?}", op.name(), grouped.keys());
                }
                let df = stage.into_frame();
                let out = match op {
                    Operation::Select(columns) => df.select(columns)?,
                    Operation::Rename(pairs) => {
                        df.rename(pairs.iter().map(|(old, new)| (old.as_str(), new.clone())))?
                    }
                    Operation::Arrange(keys) => df.arrange(keys.iter().cloned())?,
                    Operation::Map(f) => f(&df)?,
                    // every other operation is matched above
                    _ => df,
                };
                Ok(Stage::Frame(out))
            }
        }
    }
}

/// Builder recording operations over a shared source DataFrame
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<DataFrame>,
    operations: Vec<Operation>,
    config: EngineConfig,
}

impl Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("source_rows", &self.source.row_count())
            .field("operations", &self.operations)
            .finish()
    }
}

impl Pipeline {
    pub fn new(df: DataFrame) -> Self {
        Self::from_arc(Arc::new(df))
    }

    /// Share one source between several pipelines
    pub fn from_arc(source: Arc<DataFrame>) -> Self {
        Self {
            source,
            operations: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Append a prepared operation
    pub fn then(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn filter(self, predicate: Expr) -> Self {
        self.then(Operation::Filter(vec![predicate]))
    }

    /// Filter on several predicates, AND-combined
    pub fn filter_all<I>(self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.then(Operation::Filter(predicates.into_iter().collect()))
    }

    pub fn mutate<I, S>(self, exprs: I) -> Self
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        self.then(Operation::Mutate(
            exprs.into_iter().map(|(n, e)| (n.into(), e)).collect(),
        ))
    }

    pub fn select<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Operation::Select(columns.into_iter().map(Into::into).collect()))
    }

    pub fn rename<I, S, T>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        self.then(Operation::Rename(
            pairs.into_iter().map(|(o, n)| (o.into(), n.into())).collect(),
        ))
    }

    pub fn arrange<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SortKey>,
    {
        self.then(Operation::Arrange(keys.into_iter().map(Into::into).collect()))
    }

    pub fn group_by<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Operation::GroupBy(keys.into_iter().map(Into::into).collect()))
    }

    pub fn ungroup(self) -> Self {
        self.then(Operation::Ungroup)
    }

    pub fn summarise<I, S>(self, exprs: I) -> Self
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        self.then(Operation::Summarise(
            exprs.into_iter().map(|(n, e)| (n.into(), e)).collect(),
        ))
    }

    pub fn count<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Operation::Count(keys.into_iter().map(Into::into).collect()))
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(&DataFrame) -> Result<DataFrame> + Send + Sync + 'static,
    {
        self.then(Operation::Map(Arc::new(f)))
    }

    /// Filter on a predicate written as text, e.g. `"x > 0 && y > 0"`
    pub fn parse_filter(self, text: &str) -> Result<Self> {
        Ok(self.filter(parse(text)?))
    }

    /// Mutate from `name = expression` text
    pub fn parse_mutate(self, text: &str) -> Result<Self> {
        let (name, expr) = parse_named(text)?;
        Ok(self.mutate([(name, expr)]))
    }

    /// Summarise from `name = expression` text
    pub fn parse_summarise(self, text: &str) -> Result<Self> {
        let (name, expr) = parse_named(text)?;
        Ok(self.summarise([(name, expr)]))
    }

    /// Run every operation in order
    ///
    /// A grouping still open after the last step is dropped.
    pub fn execute(&self) -> Result<DataFrame> {
        let mut stage = Stage::Frame((*self.source).clone());
        for (i, op) in self.operations.iter().enumerate() {
            let rows_in = stage.row_count();
            stage = stage.apply(op)?;
            if self.config.log_steps {
                debug!(
                    "step {}/{} {:?}: {} -> {} rows",
                    i + 1,
                    self.operations.len(),
                    op,
                    rows_in,
                    stage.row_count()
                );
            }
        }
        Ok(stage.into_frame())
    }

    /// Text description of the recorded steps
    pub fn explain(&self) -> String {
        let mut result = String::new();
        result.push_str("Pipeline execution plan:\n");
        result.push_str("------------------------\n");
        result.push_str(&format!(
            "SOURCE: DataFrame ({} rows x {} columns)\n",
            self.source.row_count(),
            self.source.column_count()
        ));

        for (i, op) in self.operations.iter().enumerate() {
            result.push_str(&format!("{}: {:?}\n", i + 1, op));
        }

        result
    }
}

/// Run `operations` over `store` in order
pub fn pipeline<I>(store: &DataFrame, operations: I) -> Result<DataFrame>
where
    I: IntoIterator<Item = Operation>,
{
    operations
        .into_iter()
        .fold(Pipeline::new(store.clone()), Pipeline::then)
        .execute()
}

/// Run independent pipelines on the rayon pool
///
/// Results come back in input order; one failing pipeline does not affect
/// the others.
pub fn execute_all(pipelines: &[Pipeline]) -> Vec<Result<DataFrame>> {
    pipelines.par_iter().map(Pipeline::execute).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Value;
    use crate::error::Error;
    use crate::expr::{col, lit, mean};

    fn sample() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_string_column("c", vec!["A", "B", "A"]).unwrap();
        df.add_int_column("v", vec![10, 20, 30]).unwrap();
        df
    }

    #[test]
    fn steps_run_in_order() {
        let out = Pipeline::new(sample())
            .mutate([("w", col("v") * lit(2))])
            .filter(col("w").gt(lit(25)))
            .select(["c", "w"])
            .execute()
            .unwrap();
        assert_eq!(out.column_names(), &["c", "w"]);
        assert_eq!(
            out.column("w").unwrap().values(),
            vec![Value::Int64(40), Value::Int64(60)]
        );
    }

    #[test]
    fn first_error_stops_the_run() {
        let err = Pipeline::new(sample())
            .filter(col("missing").gt(lit(0)))
            .mutate([("w", col("v") + lit("x"))])
            .execute()
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(name) if name == "missing"));
    }

    #[test]
    fn grouping_flows_into_summarise() {
        let out = Pipeline::new(sample())
            .group_by(["c"])
            .summarise([("m", mean(col("v")))])
            .execute()
            .unwrap();
        assert_eq!(
            out.column("m").unwrap().values(),
            vec![Value::Float64(20.0), Value::Float64(20.0)]
        );
    }

    #[test]
    fn count_uses_open_grouping() {
        let out = Pipeline::new(sample()).group_by(["c"]).count(Vec::<String>::new()).execute().unwrap();
        assert_eq!(out.column_names(), &["c", "n"]);
        assert_eq!(out.value(0, "n").unwrap(), Value::Int64(2));
    }

    #[test]
    fn explain_lists_steps() {
        let plan = Pipeline::new(sample())
            .parse_filter("v > 10")
            .unwrap()
            .arrange([SortKey::desc("v")])
            .explain();
        assert!(plan.contains("1: Filter((v > 10))"));
        assert!(plan.contains("2: Arrange(v desc)"));
    }
}
