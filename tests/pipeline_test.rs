use std::sync::Arc;

use tidyframe::error::{Error, Result};
use tidyframe::{
    col, execute_all, lit, mean, n, pipeline, DataFrame, EngineConfig, Operation, Pipeline,
    SortKey, Value,
};

fn flights() -> Result<DataFrame> {
    let mut df = DataFrame::new();
    df.add_string_column("carrier", vec!["UA", "AA", "UA", "DL", "AA", "UA"])?;
    df.add_string_column("dest", vec!["IAH", "MIA", "IAH", "ATL", "MIA", "ORD"])?;
    df.add_float_column("dep_delay", vec![2.0, -1.0, 10.0, 4.0, 30.0, -3.0])?;
    df.add_float_column("distance", vec![1400.0, 1089.0, 1416.0, 762.0, 1096.0, 719.0])?;
    Ok(df)
}

#[test]
fn test_pipeline_function_matches_builder() -> Result<()> {
    let df = flights()?;
    let ops = vec![
        Operation::Filter(vec![col("dep_delay").gt(lit(0))]),
        Operation::GroupBy(vec!["carrier".to_string()]),
        Operation::Summarise(vec![("avg".to_string(), mean(col("dep_delay")))]),
    ];
    let from_ops = pipeline(&df, ops)?;

    let built = Pipeline::new(df)
        .filter(col("dep_delay").gt(lit(0)))
        .group_by(["carrier"])
        .summarise([("avg", mean(col("dep_delay")))])
        .execute()?;

    assert_eq!(from_ops, built);
    assert_eq!(built.column_names(), &["carrier", "avg"]);
    assert_eq!(built.value(0, "carrier")?, Value::Str("UA".into()));
    assert_eq!(built.value(0, "avg")?, Value::Float64(6.0));
    Ok(())
}

#[test]
fn test_pipeline_from_text() -> Result<()> {
    let out = Pipeline::new(flights()?)
        .parse_filter("dest %in% c(\"IAH\", \"MIA\")")?
        .parse_mutate("hours = distance / 500")?
        .group_by(["dest"])
        .parse_summarise("longest = max(hours)")?
        .arrange([SortKey::desc("longest")])
        .execute()?;

    assert_eq!(out.row_count(), 2);
    assert_eq!(out.value(0, "dest")?, Value::Str("IAH".into()));
    assert_eq!(out.value(0, "longest")?, Value::Float64(1416.0 / 500.0));
    Ok(())
}

#[test]
fn test_parse_errors_surface_at_build() {
    let err = Pipeline::new(DataFrame::new())
        .parse_filter("x > ")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
}

#[test]
fn test_pipeline_fails_fast() -> Result<()> {
    let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&ran);

    let err = Pipeline::new(flights()?)
        .mutate([("bad", col("carrier") + lit(1))])
        .map(move |df| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(df.clone())
        })
        .execute()
        .unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_row_preserving_verbs_keep_grouping() -> Result<()> {
    let out = Pipeline::new(flights()?)
        .group_by(["carrier"])
        .arrange([SortKey::desc("dep_delay")])
        .rename([("carrier", "airline")])
        .select(["dep_delay"])
        .summarise([("rows", n()), ("worst", tidyframe::max(col("dep_delay")))])
        .execute()?;

    // groups follow first appearance after the sort
    assert_eq!(out.column_names(), &["airline", "rows", "worst"]);
    assert_eq!(
        out.row(0)?,
        vec![Value::Str("AA".into()), Value::Int64(2), Value::Float64(30.0)]
    );
    assert_eq!(
        out.row(1)?,
        vec![Value::Str("UA".into()), Value::Int64(3), Value::Float64(10.0)]
    );
    assert_eq!(out.row_count(), 3);
    Ok(())
}

#[test]
fn test_map_drops_grouping() -> Result<()> {
    let out = Pipeline::new(flights()?)
        .group_by(["carrier"])
        .map(|df| Ok(df.clone()))
        .summarise([("rows", n())])
        .execute()?;

    assert_eq!(out.row_count(), 1);
    assert_eq!(out.value(0, "rows")?, Value::Int64(6));
    Ok(())
}

#[test]
fn test_grouped_filter_stays_grouped() -> Result<()> {
    let out = Pipeline::new(flights()?)
        .group_by(["carrier"])
        .filter(col("dep_delay").equal(tidyframe::max(col("dep_delay"))))
        .count(Vec::<String>::new())
        .execute()?;

    assert_eq!(out.column_names(), &["carrier", "n"]);
    assert_eq!(out.row_count(), 3);
    Ok(())
}

#[test]
fn test_empty_pipeline_is_identity() -> Result<()> {
    let df = flights()?;
    let out = Pipeline::new(df.clone()).execute()?;
    assert_eq!(out, df);

    let out = Pipeline::new(df.clone()).group_by(["dest"]).execute()?;
    assert_eq!(out, df);
    Ok(())
}

#[test]
fn test_execute_all_keeps_order() -> Result<()> {
    let source = Arc::new(flights()?);
    let pipelines = vec![
        Pipeline::from_arc(Arc::clone(&source)).count(["carrier"]),
        Pipeline::from_arc(Arc::clone(&source)).filter(col("nope").gt(lit(1))),
        Pipeline::from_arc(Arc::clone(&source))
            .with_config(EngineConfig {
                log_steps: false,
                ..EngineConfig::default()
            })
            .select(["dest"]),
    ];

    let results = execute_all(&pipelines);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(DataFrame::row_count).ok(), Some(3));
    assert!(matches!(results[1], Err(Error::ColumnNotFound(_))));
    assert_eq!(
        results[2].as_ref().map(DataFrame::column_count).ok(),
        Some(1)
    );
    Ok(())
}

#[test]
fn test_explain() {
    let plan = Pipeline::new(DataFrame::new())
        .filter(col("x").gt(lit(0)).and(col("y").gt(lit(0))))
        .mutate([("z", col("x") + col("y"))])
        .group_by(["z"])
        .summarise([("n", n())])
        .explain();

    assert!(plan.starts_with("Pipeline execution plan:"));
    assert!(plan.contains("1: Filter(((x > 0) && (y > 0)))"));
    assert!(plan.contains("2: Mutate(z = (x + y))"));
    assert!(plan.contains("3: GroupBy(z)"));
    assert!(plan.contains("4: Summarise(n = n())"));
}
