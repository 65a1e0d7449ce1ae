use pv_switcher::config::{Config, CounterResetPolicy, RegisterFormat};
use std::fs;
use std::time::Duration;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.meters[0].host = "10.0.0.5".to_string();
    cfg.controls.counter_reset = CounterResetPolicy::OnDisengage;
    cfg.cycle_log.file = path.with_extension("txt").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.meters[0].host, "10.0.0.5");
    assert_eq!(loaded.controls.counter_reset, CounterResetPolicy::OnDisengage);
    assert_eq!(loaded.cycle_log.file, cfg.cycle_log.file);
}

#[test]
fn partial_yaml_keeps_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        b"threshold_watts: 2000\nmeters:\n  - host: 10.1.1.1\n    format: u16\n",
    )
    .unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();

    assert_eq!(cfg.threshold_watts, 2000);
    assert_eq!(cfg.meters.len(), 1);
    assert_eq!(cfg.meters[0].host, "10.1.1.1");
    assert_eq!(cfg.meters[0].format, RegisterFormat::U16);
    assert_eq!(cfg.meters[0].port, 502);
    assert_eq!(cfg.minimum_on_time(), Duration::from_secs(60));
    assert_eq!(cfg.periods(), 5);
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    cfg.threshold_watts = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.minimum_on_time_minutes = 0.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.maximum_on_time_minutes = 0.5;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.interval_minutes = f64::NAN;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.meters.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.meters[0].port = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.timezone = "Mars/Olympus_Mons".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn named_timezone_is_accepted() {
    let mut cfg = Config::default();
    cfg.timezone = "Europe/Berlin".to_string();
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn from_missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
