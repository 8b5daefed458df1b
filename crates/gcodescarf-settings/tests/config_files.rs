use gcodescarf_settings::{Config, LineEndingSetting, SettingsError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_defaults() {
    let config = Config::new();
    assert_eq!(config.scarf.layer_height, 0.2);
    assert_eq!(config.scarf.overlap, 2.0);
    assert_eq!(config.scarf.loop_tolerance, 0.1);
    assert_eq!(config.scarf.taper_resolution, 0.5);
    assert_eq!(config.output.line_ending, LineEndingSetting::Auto);
    assert!(config.output.emit_markers);
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::new();
    config.scarf.overlap = 3.5;
    config.output.line_ending = LineEndingSetting::CrLf;
    config.output.emit_markers = false;
    config.save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[scarf]"));
    assert!(text.contains("line_ending = \"crlf\""));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::new();
    config.scarf.taper_resolution = 0.25;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.scarf.taper_resolution, 0.25);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[scarf]\noverlap = 4.0\n").unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.scarf.overlap, 4.0);
    assert_eq!(loaded.scarf.layer_height, 0.2);
    assert!(loaded.output.emit_markers);
}

#[test]
fn test_invalid_parameter_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "scarf": { "loop_tolerance": 0.0 } }"#).unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidSetting(_)));
}

#[test]
fn test_invalid_parameter_rejected_on_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::new();
    config.scarf.layer_height = -0.2;
    assert!(config.save_to_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_malformed_files() {
    let dir = tempdir().unwrap();

    let json = dir.path().join("config.json");
    fs::write(&json, "{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(&json),
        Err(SettingsError::JsonError(_))
    ));

    let toml = dir.path().join("config.toml");
    fs::write(&toml, "[scarf\n").unwrap();
    assert!(matches!(
        Config::load_from_file(&toml),
        Err(SettingsError::TomlError(_))
    ));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "scarf: {}").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::IoError(_)));
}
