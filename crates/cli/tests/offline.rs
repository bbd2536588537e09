//! Binary tests that need no running editor.

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn run(lock_dir: &Path, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_nvim-control"))
		.arg("--lock-dir")
		.arg(lock_dir)
		.args(args)
		.env_remove("CLAUDE_CODE_SSE_PORT")
		.env_remove("NVIM_CONTROL_PORT")
		.env_remove("NVIM_CONTROL_LOCK_DIR")
		.env_remove("RUST_LOG")
		.stdin(Stdio::null())
		.output()
		.expect("failed to execute nvim-control")
}

fn stdout(output: &Output) -> String {
	String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
	String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A port nothing listens on.
fn closed_port() -> u16 {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	listener.local_addr().unwrap().port()
}

#[test]
fn one_shot_without_session_exits_1() {
	let dir = tempfile::tempdir().unwrap();

	for args in [&["exec", "vsplit"][..], &["windows"], &["list-tools"], &["lua", "return 1"]] {
		let output = run(dir.path(), args);
		assert_eq!(output.status.code(), Some(1), "args: {args:?}");
		assert!(
			stderr(&output).contains("No Neovim instance found"),
			"stderr: {}",
			stderr(&output)
		);
		assert!(stdout(&output).is_empty());
	}
}

#[test]
fn one_shot_without_session_in_json_mode_prints_envelope() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["-f", "json", "windows"]);

	assert_eq!(output.status.code(), Some(1));
	let envelope: Value = serde_json::from_str(&stdout(&output)).unwrap();
	assert_eq!(envelope["ok"], false);
	assert_eq!(envelope["error"]["code"], "SESSION_NOT_FOUND");
}

#[test]
fn hinted_port_without_lock_file_fails() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("100.lock"), r#"{"authToken":"t"}"#).unwrap();

	let output = run(dir.path(), &["--port", "4567", "exec", "vsplit"]);
	assert_eq!(output.status.code(), Some(1));
	assert!(stderr(&output).contains("4567"), "stderr: {}", stderr(&output));
}

#[test]
fn invalid_raw_arguments_exit_1() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["raw", "openFile", "--args", "{oops"]);

	assert_eq!(output.status.code(), Some(1));
	assert!(stderr(&output).contains("--args is not valid JSON"));
}

#[test]
fn usage_errors_exit_2() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["open", "a.lua", "--split", "diagonal"]);
	assert_eq!(output.status.code(), Some(2));
}

#[test]
fn mcp_server_without_session_prints_synthetic_error() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["mcp-server"]);

	assert_eq!(output.status.code(), Some(0));
	let text = stdout(&output);
	assert_eq!(text.lines().count(), 1, "stdout: {text}");

	let response: Value = serde_json::from_str(&text).unwrap();
	assert_eq!(response["jsonrpc"], "2.0");
	assert_eq!(response["id"], Value::Null);
	assert_eq!(response["error"]["code"], -32603);
	assert!(
		response["error"]["message"]
			.as_str()
			.unwrap()
			.starts_with("No Neovim instance found")
	);
}

#[test]
fn mcp_server_json_format_keeps_stdout_to_the_protocol() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["-f", "json", "mcp-server"]);

	assert_eq!(output.status.code(), Some(0));
	let text = stdout(&output);
	assert_eq!(text.lines().count(), 1, "stdout: {text}");
	assert!(!text.contains("\"ok\""));
}

#[test]
fn mcp_server_connect_failure_prints_synthetic_error() {
	let dir = tempfile::tempdir().unwrap();
	let port = closed_port();
	fs::write(dir.path().join(format!("{port}.lock")), r#"{"authToken":"t"}"#).unwrap();

	let output = run(dir.path(), &["mcp-server"]);
	assert_eq!(output.status.code(), Some(0));

	let response: Value = serde_json::from_str(&stdout(&output)).unwrap();
	assert_eq!(response["error"]["code"], -32603);
	assert!(
		response["error"]["message"]
			.as_str()
			.unwrap()
			.starts_with("Failed to connect to Neovim:")
	);
}

#[test]
fn sessions_on_empty_directory() {
	let dir = tempfile::tempdir().unwrap();
	let output = run(dir.path(), &["sessions"]);

	assert_eq!(output.status.code(), Some(0));
	assert!(stdout(&output).starts_with("No Neovim sessions in "));
}

#[test]
fn sessions_json_lists_lock_files_and_selection() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(
		dir.path().join("40001.lock"),
		r#"{"authToken":"secret-token","pid":77,"ideName":"Neovim","workspaceFolders":["/work"],"transport":"ws"}"#,
	)
	.unwrap();
	fs::write(dir.path().join("40002.lock"), "not json").unwrap();
	fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

	let output = run(dir.path(), &["--port", "40001", "-f", "json", "sessions"]);
	assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
	let text = stdout(&output);
	assert!(!text.contains("secret-token"));

	let rows: Value = serde_json::from_str(&text).unwrap();
	let rows = rows.as_array().unwrap();
	assert_eq!(rows.len(), 2);

	let good = rows.iter().find(|r| r["port"] == 40001).unwrap();
	assert_eq!(good["ideName"], "Neovim");
	assert_eq!(good["pid"], 77);
	assert_eq!(good["selected"], true);

	let bad = rows.iter().find(|r| r["port"] == 40002).unwrap();
	assert!(bad["error"].is_string());
	assert_eq!(bad["selected"], false);
}
