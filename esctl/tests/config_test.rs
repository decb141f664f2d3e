//! Config file loading and saving.

use esctl::config::{Config, OutputFormat};
use esctl::ErrorKind;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_explicit_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("esctl.toml");
    std::fs::write(
        &path,
        r#"
[elasticsearch]
addresses = ["https://es.example.com:9200"]
username = "elastic"
password = "secret"
insecure = true
request_timeout_secs = 20

[kibana]
addresses = ["https://kb.example.com:5601"]

[output]
format = "json"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let (config, source) = Config::load(Some(&path)).unwrap();

    assert_eq!(source, Some(path));
    assert_eq!(config.elasticsearch.addresses, vec!["https://es.example.com:9200"]);
    assert!(config.elasticsearch.insecure);
    assert_eq!(config.elasticsearch.request_timeout_secs, 20);
    assert_eq!(config.elasticsearch.slow_request_timeout_secs, 30);
    assert_eq!(config.kibana.addresses, vec!["https://kb.example.com:5601"]);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_error() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "[elasticsearch\naddresses = 1").unwrap();

    let err = Config::load_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_empty_addresses_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("esctl.toml");
    std::fs::write(&path, "[elasticsearch]\naddresses = []\n").unwrap();

    assert!(Config::load_file(&path).is_err());
}

#[test]
fn test_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/config.toml");

    let mut config = Config::default();
    config.kibana.username = Some("fleet-admin".to_string());
    config.elasticsearch.ca_cert = Some(PathBuf::from("/etc/ssl/es-ca.pem"));
    config.output.format = OutputFormat::Csv;
    config.save(&path).unwrap();

    let reloaded = Config::load_file(&path).unwrap();
    assert_eq!(reloaded.kibana.username.as_deref(), Some("fleet-admin"));
    assert_eq!(
        reloaded.elasticsearch.ca_cert,
        Some(PathBuf::from("/etc/ssl/es-ca.pem"))
    );
    assert_eq!(reloaded.output.format, OutputFormat::Csv);
    assert_eq!(reloaded.elasticsearch.addresses, vec!["http://localhost:9200"]);
}
