//! 命令行端到端测试

use assert_cmd::Command;
use predicates::prelude::*;

fn planner() -> Command {
    let mut cmd = Command::cargo_bin("cogip-planner").unwrap();
    // 不读取用户目录下的配置
    let home = tempfile::tempdir().unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path()).env("HOME", home.path());
    cmd
}

#[test]
fn test_connect_then_eof() {
    planner()
        .write_stdin(concat!(
            "{\"event\": \"robot_connected\", \"data\": {\"robot_id\": 1}}\n",
            "not json\n",
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"event\":\"pose_start\""))
        .stdout(predicate::str::contains("\"robot_id\":1"))
        .stderr(predicate::str::contains("Malformed inbound message dropped"));
}

#[test]
fn test_invalid_override_fails() {
    planner()
        .arg("--obstacle-bb-vertices")
        .arg("1")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("obstacle_bb_vertices"));
}

#[test]
fn test_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.toml");
    std::fs::write(&path, "robot_width = 42.0\n").unwrap();

    // 42 不在合法范围内
    planner()
        .arg("--config")
        .arg(&path)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("robot_width"));
}
