//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn voice_bridge_bin(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("voice-bridge").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    voice_bridge_bin(dir.path())
        .args(["config", "get", "unknown_key"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_invalid_bool() {
    let dir = tempfile::tempdir().unwrap();
    voice_bridge_bin(dir.path())
        .args(["config", "set", "validate_playback", "sometimes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("true"));
}

#[test]
fn config_init_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    voice_bridge_bin(dir.path())
        .args(["config", "init"])
        .assert()
        .success();

    voice_bridge_bin(dir.path())
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn send_without_server() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("absent.sock");
    voice_bridge_bin(dir.path())
        .args(["send", "reset", "--socket"])
        .arg(&socket)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No bridge running"));
}

#[test]
fn transcode_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    voice_bridge_bin(dir.path())
        .args(["transcode", "amr-to-wav"])
        .arg(dir.path().join("ghost.amr"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn transcode_rejects_non_amr_input() {
    let dir = tempfile::tempdir().unwrap();
    let fake = dir.path().join("fake.amr");
    std::fs::write(&fake, b"RIFF....WAVE").unwrap();

    voice_bridge_bin(dir.path())
        .args(["transcode", "amr-to-wav"])
        .arg(&fake)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid container"));
}

#[test]
fn unknown_transcode_direction() {
    let dir = tempfile::tempdir().unwrap();
    voice_bridge_bin(dir.path())
        .args(["transcode", "mp3-to-amr", "x"])
        .assert()
        .code(2);
}
