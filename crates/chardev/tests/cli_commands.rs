#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn chardev(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chardev"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("CHARDEV_LOG")
        .env_remove("CHARDEV_DEVICE_NAME")
        .env_remove("CHARDEV_CLASS_NAME")
        .output()
        .expect("chardev should run")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be one JSON document")
}

#[test]
fn exchange_outputs_annotated_message() {
    let output = chardev(&["--format", "json", "exchange", "hello", "--reread"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value = json_stdout(&output);
    assert_eq!(value["device"], "/dev/chardev");
    assert_eq!(value["opens"], 1);
    let round = &value["exchanges"][0];
    assert_eq!(round["sent"], "hello");
    assert_eq!(round["written"], 5);
    assert_eq!(round["received"], "hello (5 letters)");
    assert_eq!(round["received_len"], 17);
    assert_eq!(round["reread_len"], 0);
}

#[test]
fn exchange_with_short_buffer_reports_bad_address() {
    let output = chardev(&["exchange", "hello", "--buffer-size", "4"]);
    assert_eq!(output.status.code(), Some(14));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read failed"), "stderr: {stderr}");
    assert!(stderr.contains(&format!("errno {}", -libc::EFAULT)), "stderr: {stderr}");
}

#[test]
fn exchange_honors_device_name_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_chardev"))
        .args(["--log-level", "error", "--format", "json", "exchange", "x"])
        .env("CHARDEV_DEVICE_NAME", "ebbchar")
        .output()
        .expect("chardev should run");
    assert!(output.status.success());
    assert_eq!(json_stdout(&output)["device"], "/dev/ebbchar");
}

#[test]
fn lifecycle_journal_is_in_reverse_order() {
    let output = chardev(&["--format", "json", "lifecycle"]);
    assert!(output.status.success());

    let value = json_stdout(&output);
    assert_eq!(value["loaded"], true);
    assert_eq!(value["major"], 254);
    assert_eq!(value["leaked"], 0);
    let ops: Vec<&str> = value["journal"]
        .as_array()
        .expect("journal should be an array")
        .iter()
        .map(|entry| entry["op"].as_str().expect("op should be a string"))
        .collect();
    assert_eq!(
        ops,
        [
            "allocate_major",
            "create_class",
            "create_device_node",
            "destroy_device_node",
            "unregister_class",
            "release_major",
        ]
    );
}

#[test]
fn lifecycle_class_failure_releases_major() {
    let output = chardev(&["--format", "json", "lifecycle", "--fail-at", "class"]);
    assert_eq!(output.status.code(), Some(3));

    let value = json_stdout(&output);
    assert_eq!(value["loaded"], false);
    assert_eq!(value["errno"], -libc::ENOMEM);
    assert_eq!(value["leaked"], 0);
    let ops: Vec<&str> = value["journal"]
        .as_array()
        .expect("journal should be an array")
        .iter()
        .map(|entry| entry["op"].as_str().expect("op should be a string"))
        .collect();
    assert_eq!(ops, ["allocate_major", "failed", "release_major"]);
}

#[test]
fn lifecycle_rejects_non_positive_errno() {
    let output = chardev(&["lifecycle", "--fail-at", "node", "--errno", "0"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = chardev(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("chardev {}", env!("CARGO_PKG_VERSION")));
}
