//! CLI contract tests.

use assert_cmd::Command;

fn sentinel(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sentinel").expect("binary should build");
    cmd.current_dir(dir.path())
        .env("SENTINEL_CONFIG_PATH", dir.path().join("sentinel.toml"))
        .env("SENTINEL_LOGS_DIR", dir.path().join("logs"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn validate_accepts_formatted_number() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = sentinel(&dir)
        .args(["validate", "+1 (555) 123-4567"])
        .output()
        .expect("should run");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("valid: +1 (555) 123-4567"));
}

#[test]
fn validate_rejects_letters_with_failure_status() {
    let dir = tempfile::tempdir().expect("temp dir");
    sentinel(&dir).args(["validate", "abc"]).assert().failure();
}

#[test]
fn encode_prints_data_url() {
    let dir = tempfile::tempdir().expect("temp dir");
    let frame = dir.path().join("frame.yuv");
    let mut bytes = vec![100_u8; 256];
    bytes.extend(vec![128_u8; 128]);
    std::fs::write(&frame, bytes).expect("write frame");

    let output = sentinel(&dir)
        .arg("encode")
        .arg(&frame)
        .args(["--width", "16", "--height", "16"])
        .output()
        .expect("should run");
    assert!(output.status.success());
    assert!(stdout_of(&output).starts_with("data:image/jpeg;base64,"));
}

#[test]
fn encode_rejects_empty_frame() {
    let dir = tempfile::tempdir().expect("temp dir");
    let frame = dir.path().join("empty.yuv");
    std::fs::write(&frame, b"").expect("write frame");

    sentinel(&dir)
        .arg("encode")
        .arg(&frame)
        .args(["--width", "4", "--height", "4"])
        .assert()
        .failure();
}

#[test]
fn run_dispatches_call_from_stdin() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = sentinel(&dir)
        .arg("run")
        .write_stdin("call 911\nbogusCommand\nquit\n")
        .output()
        .expect("should run");

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("[dialer]"), "stdout: {stdout}");
    assert!(stdout.contains("Initiating emergency call to 911..."));
    assert!(stdout.contains("[error] unknown command: bogusCommand"));
    assert!(dir.path().join("logs").exists());
}
