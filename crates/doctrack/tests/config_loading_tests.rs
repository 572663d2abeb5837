//! Loading registry settings from disk.

use std::io::Write;

use doctrack::{load_config, ConfigError, DoctrackError, JobRegistry, RegistryConfig};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_from_file() {
    let file = write_config(r#"{"version": "1.0", "notifyCapacity": 8, "redactNames": false}"#);

    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config,
        RegistryConfig {
            version: "1.0".to_string(),
            notify_capacity: 8,
            redact_names: false,
        }
    );

    let registry: JobRegistry = JobRegistry::with_config(&config);
    registry.start_tracking("h1", "/inbox/doc.pdf");
    assert_eq!(
        registry.get_record("h1").unwrap().original_name,
        "/inbox/doc.pdf"
    );
}

#[test]
fn test_load_config_invalid_json() {
    let file = write_config("{ not json");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJson(_)));
}

#[test]
fn test_load_config_validation_error() {
    let file = write_config(r#"{"notifyCapacity": 0}"#);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("notifyCapacity"));
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("doctrack.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_registry_from_config_file() {
    let file = write_config(r#"{"notifyCapacity": 2}"#);
    let registry: JobRegistry = JobRegistry::from_config_file(file.path()).unwrap();
    let mut rx = registry.subscribe();

    for id in ["a", "b", "c"] {
        registry.start_tracking(id, "doc.pdf");
    }
    // Capacity 2: the oldest update was dropped.
    assert!(rx.try_recv().is_err());
    assert_eq!(rx.try_recv().unwrap().job_id, "b");
}

#[test]
fn test_registry_from_bad_config_file() {
    let file = write_config(r#"{"version": "0.9"}"#);
    let err = JobRegistry::<()>::from_config_file(file.path())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        DoctrackError::Config(ConfigError::Validation { .. })
    ));
}
