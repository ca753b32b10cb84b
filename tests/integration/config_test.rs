#![allow(clippy::expect_used)]

use std::time::Duration;

use remonitor::application::config::AppConfig;
use remonitor::domain::registry::ConfigError;
use remonitor::domain::value_objects::check_kind::CheckKind;

const FULL_CONFIG: &str = r#"
[scheduler]
max_concurrent_probes = 4
grace_period_secs = 2

[dispatcher]
max_attempts = 3
base_delay_ms = 250
cooldown_secs = 120

[defaults]
interval_secs = 15
timeout_secs = 3
failure_threshold = 2
recovery_threshold = 1

[channels]
log_file = "~/.local/share/remonitor/alerts.log"
webhook_url = "https://example.com/hooks/monitoring"

[database]
path = "~/.local/share/remonitor/remonitor.db"
retention_hours = 72

[[targets]]
id = "api"
check = { type = "http", url = "https://api.example.com/health", expect_status = 204 }
interval_secs = 5
failure_threshold = 5
tags = ["prod", "critical"]

[[targets]]
id = "db"
check = { type = "tcp", addr = "db.internal:5432" }

[[targets]]
id = "cdn"
check = { type = "latency", url = "https://cdn.example.com", max_ms = 250 }
timeout_secs = 1

[[targets]]
id = "office-temp"
check = { type = "value", url = "https://sensors.example.com/1/appliances", pointer = "/newest_events/te/val", offset = -0.5, min = 10.0, max = 30.0 }
interval_secs = 60
"#;

#[test]
fn full_config_round_trips_into_a_registry() {
    let config: AppConfig = toml::from_str(FULL_CONFIG).expect("parse config");
    let registry = config.build_registry().expect("build registry");

    assert_eq!(registry.len(), 4);
    assert_eq!(config.database.retention_hours, 72);

    // Explicit overrides win; hard threshold defaults to twice the failure threshold
    let api = registry.get("api").expect("api target");
    assert_eq!(api.interval, Duration::from_secs(5));
    assert_eq!(api.timeout, Duration::from_secs(3));
    assert_eq!(api.failure_threshold, 5);
    assert_eq!(api.hard_failure_threshold, 10);
    assert_eq!(api.tags, vec!["prod", "critical"]);
    assert!(matches!(
        api.check,
        CheckKind::Http {
            expect_status: 204,
            ..
        }
    ));

    // Bare entries inherit everything from [defaults]
    let db = registry.get("db").expect("db target");
    assert_eq!(db.interval, Duration::from_secs(15));
    assert_eq!(db.timeout, Duration::from_secs(3));
    assert_eq!(db.failure_threshold, 2);
    assert_eq!(db.hard_failure_threshold, 4);
    assert_eq!(db.recovery_threshold, 1);

    let cdn = registry.get("cdn").expect("cdn target");
    assert_eq!(cdn.timeout, Duration::from_secs(1));
    assert!(matches!(cdn.check, CheckKind::Latency { max_ms: 250, .. }));

    let sensor = registry.get("office-temp").expect("sensor target");
    assert_eq!(sensor.interval, Duration::from_secs(60));
    assert!(matches!(
        sensor.check,
        CheckKind::Value {
            min: Some(_),
            max: Some(_),
            ..
        }
    ));
}

#[test]
fn registration_order_is_preserved() {
    let config: AppConfig = toml::from_str(FULL_CONFIG).expect("parse config");
    let registry = config.build_registry().expect("build registry");

    let ids: Vec<&str> = registry.all().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["api", "db", "cdn", "office-temp"]);
}

#[test]
fn duplicate_target_ids_are_rejected() {
    let config: AppConfig = toml::from_str(
        r#"
[[targets]]
id = "api"
check = { type = "tcp", addr = "a:1" }

[[targets]]
id = "api"
check = { type = "tcp", addr = "b:2" }
"#,
    )
    .expect("parse config");

    let err = config.build_registry().expect_err("duplicate id");
    assert!(matches!(err, ConfigError::DuplicateTarget(id) if id == "api"));
}

#[test]
fn zero_interval_is_rejected() {
    let config: AppConfig = toml::from_str(
        r#"
[[targets]]
id = "api"
check = { type = "tcp", addr = "a:1" }
interval_secs = 0
"#,
    )
    .expect("parse config");

    assert!(matches!(
        config.build_registry(),
        Err(ConfigError::InvalidInterval(_))
    ));
}

#[test]
fn empty_document_yields_defaults_and_an_empty_registry() {
    let config: AppConfig = toml::from_str("").expect("parse empty config");
    assert_eq!(config.scheduler.max_concurrent_probes, 8);
    assert_eq!(config.dispatcher.max_attempts, 5);
    assert_eq!(config.defaults.interval_secs, 30);
    assert!(config.channels.webhook_url.is_none());

    let registry = config.build_registry().expect("build registry");
    assert!(registry.is_empty());
}

#[test]
fn saved_config_loads_back_identically() {
    let config: AppConfig = toml::from_str(FULL_CONFIG).expect("parse config");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.toml");
    config.save_to(&path).expect("save config");

    let reloaded = AppConfig::load_from(&path).expect("reload config");
    assert_eq!(
        reloaded.resolve_targets(),
        config.resolve_targets(),
        "resolved targets should survive a save/load cycle"
    );
    assert_eq!(reloaded.channels.log_file, config.channels.log_file);
}

#[test]
fn load_or_create_writes_a_default_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");

    let config = AppConfig::load_or_create(&path).expect("create default");
    assert!(path.exists(), "default config file should be written");
    assert!(config.targets.is_empty());

    // A second load reads the file it just wrote
    let reloaded = AppConfig::load_or_create(&path).expect("load existing");
    assert_eq!(reloaded.defaults.interval_secs, config.defaults.interval_secs);
}
