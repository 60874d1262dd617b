#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};

use stdiomux::frame::{FrameReader, Op};
use stdiomux::session::HelloArgs;

const BIN: &str = env!("CARGO_BIN_EXE_stdiomux");

fn call(extra: &[&str], tool_args: &[&str]) -> std::process::Output {
    Command::new(BIN)
        .args(["--log-level", "error", "--format", "json", "call"])
        .args(extra)
        .arg("--")
        .arg(BIN)
        .args(["--log-level", "error"])
        .args(tool_args)
        .stdin(Stdio::null())
        .output()
        .expect("call should run")
}

#[test]
fn call_round_trips_lines_through_serve() {
    let output = call(&["-m", "hello", "-m", "multiplexed world"], &["serve"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let replies: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is json"))
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["stream_id"], 1);
    assert_eq!(replies[0]["reply"], "hello");
    assert_eq!(replies[1]["request"], "multiplexed world");
    assert_eq!(replies[1]["reply"], "multiplexed world");
}

#[test]
fn call_with_compression_on_both_sides() {
    let long = "z".repeat(4096);
    let output = call(&["--compression", "-m", &long], &["serve", "--compression"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&long));
}

#[test]
fn call_reads_messages_from_stdin() {
    let mut child = Command::new(BIN)
        .args(["--log-level", "error", "--format", "raw", "call", "--", BIN])
        .args(["--log-level", "error", "serve"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("call should start");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"one\ntwo\n")
        .expect("write stdin");

    let output = child.wait_with_output().expect("call should finish");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "one\ntwo\n");
}

#[test]
fn unknown_service_fails_the_call() {
    let output = call(&["--service", "nope", "-m", "ping"], &["serve"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_tool_is_a_usage_error() {
    let output = Command::new(BIN)
        .args(["--log-level", "error", "call", "-m", "x", "--"])
        .arg("/nonexistent/stdiomux-tool")
        .output()
        .expect("call should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn serve_says_hello_and_exits_on_eof() {
    let output = Command::new(BIN)
        .args(["--log-level", "error", "serve"])
        .stdin(Stdio::null())
        .output()
        .expect("serve should run");
    assert!(output.status.success());

    let mut frames = FrameReader::new(&output.stdout[..]);
    let hello = frames.read_frame().expect("hello frame");
    assert_eq!((hello.op, hello.stream_id), (Op::Hello, 0));
    let args: HelloArgs = serde_json::from_slice(&hello.payload).expect("hello payload");
    assert_eq!(args.tool_api_version, stdiomux::session::TOOL_API_VERSION);
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(BIN)
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("stdiomux {}", env!("CARGO_PKG_VERSION"))
    );
}
