use super::*;
use std::collections::HashMap;

fn write_config_file(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, contents.as_bytes()).expect("write config");
    path
}

#[test]
fn default_config_validates() {
    validate_config(&default_config()).expect("default config is valid");
}

#[test]
fn read_config_fills_defaults_for_omitted_fields() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_config_file(
        dir.path(),
        r#"{"schema_version": 1, "spreadsheet_id": "sheet-123"}"#,
    );
    let config = read_config(&path).expect("read config");
    assert_eq!(config.spreadsheet_id, "sheet-123");
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.header_rows, 2);
    assert_eq!(config.ranges, RangeConfig::default());
    assert!(config.lm_command.is_none());
}

#[test]
fn read_config_rejects_unknown_fields() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_config_file(dir.path(), r#"{"schema_version": 1, "sheet": "x"}"#);
    assert!(read_config(&path).is_err());
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_config(Some(dir.path().join("absent.json").as_path())).unwrap_err();
    assert!(err.to_string().contains("read config"));
}

#[test]
fn env_overrides_replace_file_values() {
    let mut config = default_config();
    config.spreadsheet_id = "from-file".to_string();
    let env: HashMap<&str, &str> = [
        (SPREADSHEET_ID_ENV, "from-env"),
        (LM_COMMAND_ENV, "llm -m small"),
    ]
    .into_iter()
    .collect();
    apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));
    assert_eq!(config.spreadsheet_id, "from-env");
    assert_eq!(config.lm_command.as_deref(), Some("llm -m small"));
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = default_config();
    config.schema_version = 2;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.ranges.recipes = "  ".to_string();
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("ranges.recipes"));

    let mut config = default_config();
    config.ranges.shopping_list = "A3:E".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.lm_command = Some("llm 'unterminated".to_string());
    assert!(validate_config(&config).is_err());
}
