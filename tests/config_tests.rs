use std::io::Write;
use winding_floor::config::{Config, StoreBackend};
use winding_floor::domains::floor::FloorSettings;

#[test]
fn defaults_follow_the_floor_settings() {
    let config = Config::default();
    let settings = FloorSettings::from(&config.simulation);

    assert_eq!(settings, FloorSettings::default());
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert!(config.run.run_for_ms.is_none());
    assert!(config.source.models_path.is_none());
}

#[tokio::test]
async fn from_file_reads_partial_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[simulation]
quantum_ms = 20
auto_start_winders = false

[run]
run_for_ms = 60000

[store]
backend = "file"
path = "out/snapshots.jsonl"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).await.unwrap();

    assert_eq!(config.simulation.quantum_ms, 20);
    assert!(!config.simulation.auto_start_winders);
    assert_eq!(config.simulation.sync_period_ms, FloorSettings::default().sync_period_ms);
    assert_eq!(config.run.run_for_ms, Some(60_000));
    assert_eq!(config.store.backend, StoreBackend::File);
    assert_eq!(config.store.path.to_str(), Some("out/snapshots.jsonl"));
    assert_eq!(config.logging.buffer_capacity, 1024);
}

#[test]
fn load_tolerates_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
    assert_eq!(config.run.report_every_ms, 10_000);
}

#[test]
fn zero_periods_are_clamped() {
    let mut config = Config::default();
    config.simulation.quantum_ms = 0;
    config.simulation.scheduler_period_ms = 0;

    let settings = FloorSettings::from(&config.simulation);
    assert_eq!(settings.quantum_ms, 1);
    assert_eq!(settings.scheduler_period_ms, 1);
}
