use busctl::config::{ConfigError, ConfigValidationError, load_config_file};
use claims::*;
use server::lock_cycle::AbandonPolicy;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_file_is_loaded() {
    let file = config_file(
        r#"
fetch_batch_size = 250
bulk_receive_timeout_secs = 3
search_receive_timeout_secs = 30
abandon_policy = "deferred"
peek_count = 20

[servicebus]
connection_string = "Endpoint=sb://contoso.servicebus.windows.net/;SharedAccessKeyName=RootManageSharedAccessKey;SharedAccessKey=c2VjcmV0"

[logging]
level = "debug"
file = "/tmp/busctl-test.log"

[update_check]
enabled = false
"#,
    );

    let config = assert_ok!(load_config_file(file.path()));

    let lock_cycle = config.lock_cycle();
    assert_eq!(lock_cycle.fetch_batch_size(), 250);
    assert_eq!(lock_cycle.bulk_receive_timeout_secs(), 3);
    assert_eq!(lock_cycle.search_receive_timeout_secs(), 30);
    assert_eq!(lock_cycle.abandon_policy(), AbandonPolicy::Deferred);
    assert_eq!(lock_cycle.peek_count(), 20);
    assert_some!(config.servicebus().connection_string());
    assert_eq!(config.logging().level(), "debug");
    assert_eq!(config.logging().file(), Some("/tmp/busctl-test.log"));
    assert!(!config.update_check().enabled());
}

#[test]
fn empty_file_uses_defaults() {
    let file = config_file("");

    let config = assert_ok!(load_config_file(file.path()));

    assert_eq!(config.lock_cycle().fetch_batch_size(), 100);
    assert_eq!(config.lock_cycle().abandon_policy(), AbandonPolicy::PerBatch);
    assert_none!(config.servicebus().connection_string());
    assert!(config.update_check().enabled());
}

#[test]
fn out_of_range_values_are_all_reported() {
    let file = config_file(
        r#"
fetch_batch_size = 5000
bulk_receive_timeout_secs = 0
search_receive_timeout_secs = 601
"#,
    );

    let error = assert_err!(load_config_file(file.path()));

    let errors = match error {
        ConfigError::Invalid(errors) => errors,
        other => panic!("expected validation errors, got {other}"),
    };
    assert_eq!(errors.len(), 3);
    assert_matches!(
        &errors[0],
        ConfigValidationError::FetchBatchSize {
            configured: 5000,
            ..
        }
    );
    assert_matches!(
        &errors[1],
        ConfigValidationError::ReceiveTimeout {
            field: "bulk_receive_timeout_secs",
            configured: 0,
            ..
        }
    );
    assert_matches!(
        &errors[2],
        ConfigValidationError::ReceiveTimeout {
            field: "search_receive_timeout_secs",
            ..
        }
    );
    assert!(errors[0].user_message().contains("fetch_batch_size"));
}

#[test]
fn unknown_abandon_policy_fails_to_deserialize() {
    let file = config_file(r#"abandon_policy = "never""#);

    let error = assert_err!(load_config_file(file.path()));
    assert_matches!(error, ConfigError::Deserialize(_));
}

#[test]
fn missing_explicit_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let error = assert_err!(load_config_file(&path));
    assert_matches!(error, ConfigError::Load(_));
}
