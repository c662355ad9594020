use tidyframe::column::{BooleanColumn, Float64Column, Int64Column, StringColumn};
use tidyframe::error::{Error, Result};
use tidyframe::{col, lit, mean, n, parse, sum, DataFrame, SortKey, Value};

fn points() -> Result<DataFrame> {
    DataFrame::from_columns([
        ("x", Int64Column::new(vec![0, 3, 4])),
        ("y", Int64Column::new(vec![5, 3, 0])),
    ])
}

#[test]
fn test_filter_two_predicates() -> Result<()> {
    let df = points()?;
    let out = df.filter([col("x").gt(lit(0)), col("y").gt(lit(0))])?;

    assert_eq!(out.row_count(), 1);
    assert_eq!(out.row(0)?, vec![Value::Int64(3), Value::Int64(3)]);
    Ok(())
}

#[test]
fn test_filter_from_text() -> Result<()> {
    let df = points()?;
    let out = df.filter([parse("x > 0 & y > 0")?])?;
    assert_eq!(out.row_count(), 1);

    let out = df.filter([parse("x %in% c(0, 4)")?])?;
    assert_eq!(
        out.column("y")?.values(),
        vec![Value::Int64(5), Value::Int64(0)]
    );
    Ok(())
}

#[test]
fn test_filter_missing_is_dropped() -> Result<()> {
    let mut df = DataFrame::new();
    df.add_column(
        "dep_delay",
        Float64Column::from_options(vec![Some(2.0), None, Some(-4.0), Some(11.0)]),
    )?;
    df.add_string_column("dest", vec!["IAH", "HOU", "IAH", "MIA"])?;

    let out = df.filter([parse("dep_delay > 0 && dest %in% c(\"IAH\", \"HOU\")")?])?;
    assert_eq!(out.row_count(), 1);
    assert_eq!(out.value(0, "dep_delay")?, Value::Float64(2.0));

    // `!(x > 0)` is still missing where x is missing
    let out = df.filter([!col("dep_delay").gt(lit(0))])?;
    assert_eq!(out.row_count(), 1);
    Ok(())
}

#[test]
fn test_filter_errors() -> Result<()> {
    let df = points()?;

    let err = df.filter([col("z").gt(lit(0))]).unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound(ref name) if name == "z"));

    // arithmetic is not a predicate
    let err = df.filter([col("x") + lit(1)]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));

    let err = df.filter([col("x").gt(lit("a"))]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    Ok(())
}

#[test]
fn test_filter_no_predicates_keeps_everything() -> Result<()> {
    let df = points()?;
    let out = df.filter(Vec::new())?;
    assert_eq!(out, df);
    Ok(())
}

#[test]
fn test_mutate_midpoint() -> Result<()> {
    let df = DataFrame::from_columns([
        ("x", Int64Column::new(vec![2, 5])),
        ("y", Int64Column::new(vec![4, 5])),
    ])?;
    let out = df.mutate([("size", (col("x") + col("y")) / lit(2))])?;

    assert_eq!(out.column_names(), &["x", "y", "size"]);
    assert_eq!(
        out.column("size")?.values(),
        vec![Value::Float64(3.0), Value::Float64(5.0)]
    );
    // input unchanged
    assert_eq!(df.column_count(), 2);
    Ok(())
}

#[test]
fn test_mutate_propagates_missing() -> Result<()> {
    let mut df = DataFrame::new();
    df.add_column("a", Int64Column::from_options(vec![Some(1), None, Some(3)]))?;
    let out = df.mutate([("b", col("a") * lit(10)), ("c", col("b") + lit(1))])?;

    assert_eq!(
        out.column("c")?.values(),
        vec![Value::Int64(11), Value::Null, Value::Int64(31)]
    );
    Ok(())
}

#[test]
fn test_mutate_aggregate_broadcasts() -> Result<()> {
    let df = points()?;
    let out = df.mutate([("share", col("x") / sum(col("x")))])?;
    assert_eq!(
        out.column("share")?.values(),
        vec![
            Value::Float64(0.0),
            Value::Float64(3.0 / 7.0),
            Value::Float64(4.0 / 7.0)
        ]
    );

    let out = df.mutate([("n", n())])?;
    assert_eq!(out.value(2, "n")?, Value::Int64(3));
    Ok(())
}

#[test]
fn test_mutate_on_empty_frame() -> Result<()> {
    let df = points()?.filter([col("x").gt(lit(100))])?;
    let out = df.mutate([("z", col("x") * lit(2.5))])?;
    assert_eq!(out.row_count(), 0);
    assert_eq!(out.column_names(), &["x", "y", "z"]);
    Ok(())
}

#[test]
fn test_mutate_division_by_zero_is_missing() -> Result<()> {
    let df = points()?;
    let out = df.mutate([("r", col("x") / col("y"))])?;
    assert_eq!(out.value(2, "r")?, Value::Null);
    Ok(())
}

#[test]
fn test_select_rename_arrange() -> Result<()> {
    let mut df = DataFrame::new();
    df.add_column("name", StringColumn::new(vec!["b", "a", "c"]))?;
    df.add_column("score", Int64Column::new(vec![2, 2, 1]))?;
    df.add_column("ok", BooleanColumn::new(vec![true, false, true]))?;

    let out = df
        .select(["score", "name"])?
        .rename([("score", "points")])?
        .arrange([SortKey::asc("points"), SortKey::desc("name")])?;

    assert_eq!(out.column_names(), &["points", "name"]);
    assert_eq!(
        out.column("name")?.values(),
        vec![
            Value::Str("c".into()),
            Value::Str("b".into()),
            Value::Str("a".into())
        ]
    );
    Ok(())
}

#[test]
fn test_summarise_whole_frame() -> Result<()> {
    let mut df = DataFrame::new();
    df.add_column(
        "v",
        Float64Column::from_options(vec![Some(1.0), Some(2.0), None, Some(6.0)]),
    )?;

    let out = df.summarise([
        ("n", n()),
        ("mean_all", mean(col("v"))),
        ("mean_known", mean(col("v")).na_rm()),
        ("total", sum(col("v")).na_rm()),
    ])?;

    assert_eq!(out.row_count(), 1);
    assert_eq!(out.value(0, "n")?, Value::Int64(4));
    assert_eq!(out.value(0, "mean_all")?, Value::Null);
    assert_eq!(out.value(0, "mean_known")?, Value::Float64(3.0));
    assert_eq!(out.value(0, "total")?, Value::Float64(9.0));
    Ok(())
}
