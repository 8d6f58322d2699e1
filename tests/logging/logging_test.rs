//! Tests for `src/logging.rs`.

use sentinel::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber per process; a second install returns
    // an error, but the directory is created first either way.
    let _result = sentinel::logging::init_production(&logs_dir, "debug");
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn init_production_fails_when_dir_cannot_be_created() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let file = tmp.path().join("not-a-dir");
    std::fs::write(&file, b"x").expect("should write file");

    let result = sentinel::logging::init_production(&file.join("logs"), "info");
    assert!(result.is_err());
}

#[test]
fn init_cli_tolerates_existing_subscriber() {
    sentinel::logging::init_cli("warn");
    sentinel::logging::init_cli("warn");
}
