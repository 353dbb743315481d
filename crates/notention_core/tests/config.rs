use notention_core::{ConfigError, CoreConfig};
use std::io::Write;

#[test]
fn loads_partial_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"log_level": "warn", "autosave_debounce_ms": 250, "cache_capacity": 4}}"#
    )
    .expect("write config");

    let config = CoreConfig::from_path(file.path()).expect("config loads");
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.autosave_debounce().as_millis(), 250);
    assert_eq!(config.cache_capacity, 4);
    assert_eq!(config.near_radius_km, 10.0);
    assert!(config.ontology_index().templates.len() > 1);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");
    let err = CoreConfig::from_path(&path).expect_err("missing file");
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn serialized_defaults_load_back() {
    let raw = serde_json::to_string(&CoreConfig::default()).expect("serialize config");
    assert_eq!(
        CoreConfig::from_json_str(&raw).expect("round trip"),
        CoreConfig::default()
    );
}
