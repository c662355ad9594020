use std::fs;

use tempfile::tempdir;
use tidyframe::column::Int64Column;
use tidyframe::error::{Error, Result};
use tidyframe::{DataFrame, EngineConfig};

#[test]
fn test_load_each_format() -> Result<()> {
    let dir = tempdir()?;

    let toml_path = dir.path().join("engine.toml");
    fs::write(&toml_path, "log_steps = false\n[display]\nmax_rows = 2\n")?;
    let config = EngineConfig::load(&toml_path)?;
    assert!(!config.log_steps);
    assert_eq!(config.display.max_rows, 2);

    let yaml_path = dir.path().join("engine.yml");
    fs::write(&yaml_path, "display:\n  na_repr: \"<NA>\"\n")?;
    let config = EngineConfig::load(&yaml_path)?;
    assert_eq!(config.display.na_repr, "<NA>");
    assert!(config.log_steps);

    let json_path = dir.path().join("engine.json");
    fs::write(&json_path, r#"{"display": {"float_precision": 1}}"#)?;
    let config = EngineConfig::load(&json_path)?;
    assert_eq!(config.display.float_precision, 1);
    Ok(())
}

#[test]
fn test_load_errors() -> Result<()> {
    let dir = tempdir()?;

    let ini_path = dir.path().join("engine.ini");
    fs::write(&ini_path, "max_rows=1")?;
    assert!(matches!(EngineConfig::load(&ini_path), Err(Error::Config(_))));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(EngineConfig::load(&missing), Err(Error::Io(_))));

    let zero_rows = dir.path().join("zero.toml");
    fs::write(&zero_rows, "[display]\nmax_rows = 0\n")?;
    assert!(matches!(EngineConfig::load(&zero_rows), Err(Error::Config(_))));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json")?;
    assert!(matches!(EngineConfig::load(&broken), Err(Error::Json(_))));
    Ok(())
}

#[test]
fn test_display_uses_config() -> Result<()> {
    let mut df = DataFrame::new();
    df.add_column(
        "v",
        Int64Column::from_options(vec![Some(1), None, Some(3), Some(4)]),
    )?;

    let config = EngineConfig::from_toml_str("[display]\nmax_rows = 2\nna_repr = \"--\"\n")?;
    config.validate()?;
    let text = df.display_with(&config.display);

    assert!(text.contains("--"));
    assert!(text.contains("(2 more rows)"));
    Ok(())
}
