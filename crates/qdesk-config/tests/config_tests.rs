// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the qdesk configuration system.

use std::io::Write;

use qdesk_config::diagnostic::ConfigError;
use qdesk_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use qdesk_core::types::PriorityStrategy;

const CLINIC: &str = r#"
[site]
name = "north-clinic"
log_level = "debug"

[storage]
database_path = "/tmp/qdesk-test.db"
wal_mode = false

[desk]
utc_offset_minutes = 420
estimate_minutes_per_ticket = 4
interleave_window_minutes = 90

[gateway]
host = "0.0.0.0"
port = 9000
bearer_token = "desk-token"

[bus]
channel_capacity = 64

[[services]]
id = 1
code = "XN"
name = "Blood tests"

[[services]]
id = 2
code = "KB"
name = "Consultation"
display_order = 1

[[rooms]]
id = 101
code = "XN1"
name = "Lab 1"
service = "XN"

[[rooms]]
id = 201
code = "KB1"
name = "Desk 1"
service = "KB"
active = false

[[priority]]
service = "KB"
strategy = "interleaved"
interleave_interval = 3

[[sessions]]
name = "Morning"
start = "07:00"
end = "11:30"

[[displays]]
id = "lobby"
name = "Lobby screen"
"#;

#[test]
fn full_site_config_deserializes() {
    let config = load_and_validate_str(CLINIC).expect("clinic config should be valid");

    assert_eq!(config.site.name, "north-clinic");
    assert_eq!(config.site.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/qdesk-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.desk.utc_offset_minutes, 420);
    assert_eq!(config.desk.estimate_minutes_per_ticket, 4);
    assert_eq!(config.desk.interleave_window_minutes, 90);
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("desk-token"));
    assert_eq!(config.bus.channel_capacity, 64);
    assert_eq!(config.services.len(), 2);
    assert!(!config.rooms[1].active);
    assert_eq!(config.priority[0].strategy, PriorityStrategy::Interleaved);

    let catalog = config.catalog().unwrap();
    assert_eq!(catalog.priority_settings[0].service_id, Some(2));
    assert_eq!(catalog.priority_settings[0].room_id, None);
    assert_eq!(catalog.working_sessions[0].day_of_week, None);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.site.name, "qdesk");
    assert_eq!(config.site.log_level, "info");
    assert!(config.storage.wal_mode);
    assert!(config.storage.database_path.ends_with("qdesk.db"));
    assert_eq!(config.desk.utc_offset_minutes, 0);
    assert_eq!(config.desk.estimate_minutes_per_ticket, 5);
    assert_eq!(config.desk.default_interleave_interval, 5);
    assert_eq!(config.desk.interleave_window_minutes, 120);
    assert_eq!(config.desk.publish_timeout_ms, 500);
    assert!(config.gateway.enabled);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8470);
    assert!(config.gateway.bearer_token.is_none());
    assert_eq!(config.bus.channel_capacity, 256);
    assert!(config.services.is_empty());
    assert!(config.sessions.is_empty());
}

#[test]
fn typo_in_section_is_reported_with_suggestion() {
    let errors = load_and_validate_str(
        r#"
[storage]
databse_path = "/tmp/x.db"
"#,
    )
    .expect_err("unknown key should be rejected");

    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "databse_path");
            assert_eq!(suggestion.as_deref(), Some("database_path"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_strategy_is_rejected() {
    let err = load_config_from_str(
        r#"
[[priority]]
strategy = "random"
"#,
    )
    .expect_err("unknown strategy should be rejected");
    let text = err.to_string();
    assert!(text.contains("random"), "got: {text}");
}

#[test]
fn catalog_entry_without_required_field_is_missing_key() {
    let errors = load_and_validate_str(
        r#"
[[services]]
id = 1
name = "No code"
"#,
    )
    .expect_err("service without code should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key.ends_with("code"))),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_errors_are_all_collected() {
    let errors = load_and_validate_str(
        r#"
[[rooms]]
id = 1
code = "R1"
name = "Orphan"
service = "NONE"

[[displays]]
id = "tv"
rooms = ["R2"]
"#,
    )
    .expect_err("broken references should fail");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn explicit_path_is_loaded_and_validated() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[site]\nname = \"from-file\"").unwrap();

    let config = load_and_validate_path(file.path()).expect("file config should load");
    assert_eq!(config.site.name, "from-file");
}
