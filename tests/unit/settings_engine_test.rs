//! Unit tests for the settings engine: load/save, dot-path updates, reset.

use serde_json::json;
use tempfile::TempDir;

use repomark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use repomark::types::errors::SettingsError;
use repomark::types::settings::AppSettings;

fn engine_in(tmp: &TempDir) -> SettingsEngine {
    let path = tmp.path().join("config").join("settings.json");
    SettingsEngine::new(Some(path.to_string_lossy().to_string()))
}

#[test]
fn test_defaults() {
    let settings = AppSettings::default();
    assert_eq!(settings.github.api_base_url, "https://api.github.com");
    assert_eq!(settings.github.search_per_page, 5);
    assert!(settings.github.token.is_none());
    assert_eq!(settings.import.batch_size, 5);
    assert_eq!(settings.import.batch_delay_ms, 800);
    assert!(settings.storage.database_path.is_none());
    assert_eq!(settings.logging.level, "info");
    assert!(!settings.logging.json);
}

#[test]
fn test_load_missing_file_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let settings = engine.load().unwrap();
    assert_eq!(settings, AppSettings::default());
}

#[test]
fn test_save_then_load_round_trip() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    engine.set_value("import.batch_delay_ms", json!(250)).unwrap();
    engine.set_value("github.token", json!("ghp_saved")).unwrap();

    let mut reloaded = engine_in(&tmp);
    let settings = reloaded.load().unwrap();
    assert_eq!(settings.import.batch_delay_ms, 250);
    assert_eq!(settings.github.token.as_deref(), Some("ghp_saved"));
}

#[test]
fn test_set_value_dot_notation() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    engine.set_value("import.batch_size", json!(10)).unwrap();
    engine.set_value("logging.json", json!(true)).unwrap();
    engine.set_value("storage.database_path", json!("/tmp/bm.db")).unwrap();

    let settings = engine.get_settings();
    assert_eq!(settings.import.batch_size, 10);
    assert!(settings.logging.json);
    assert_eq!(settings.storage.database_path.as_deref(), Some("/tmp/bm.db"));
}

#[test]
fn test_set_value_invalid_key() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let err = engine.set_value("import.nonexistent", json!(1)).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));
    let err = engine.set_value("nope.batch_size", json!(1)).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));
}

#[test]
fn test_set_value_empty_key() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    assert!(matches!(
        engine.set_value("", json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
}

#[test]
fn test_set_value_wrong_type() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let err = engine.set_value("import.batch_size", json!("five")).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue(_)));
    assert_eq!(engine.get_settings().import.batch_size, 5);
}

#[test]
fn test_zero_batch_size_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let err = engine.set_value("import.batch_size", json!(0)).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue(_)));
    assert_eq!(engine.get_settings().import.batch_size, 5);
}

#[test]
fn test_zero_batch_size_rejected_on_load() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();
    std::fs::write(engine.get_config_path(), r#"{"import":{"batch_size":0}}"#).unwrap();

    let mut engine = engine_in(&tmp);
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_malformed_json() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();
    std::fs::write(engine.get_config_path(), "{ not json").unwrap();

    let mut engine = engine_in(&tmp);
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_partial_file_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();
    std::fs::write(engine.get_config_path(), r#"{"logging":{"level":"debug"}}"#).unwrap();

    let mut engine = engine_in(&tmp);
    let settings = engine.load().unwrap();
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.import.batch_size, 5);
}

#[test]
fn test_reset_restores_defaults() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    engine.set_value("github.search_per_page", json!(20)).unwrap();
    engine.reset().unwrap();
    assert_eq!(engine.get_settings(), &AppSettings::default());

    let mut reloaded = engine_in(&tmp);
    assert_eq!(reloaded.load().unwrap(), AppSettings::default());
}

#[test]
fn test_default_config_path_is_settings_json() {
    let engine = SettingsEngine::new(None);
    assert!(engine.get_config_path().ends_with("settings.json"));
    assert!(engine.get_config_path().to_lowercase().contains("repomark"));
}
