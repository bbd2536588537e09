//! Rendering of editor responses for humans and agents.
//!
//! Text format prints tool results the way a shell user wants them (text
//! content, one item per line). JSON format prints the raw JSON-RPC response
//! so agents see exactly what the editor sent.

use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use nvctl_protocol::{ToolCallResult, ToolsListResult};
use nvctl_runtime::SessionEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CliError, Result};

/// Longest tool description printed by `list-tools`.
const DESCRIPTION_WIDTH: usize = 60;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Raw JSON
	Json,
}

/// How a successful tool result is turned into text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Render {
	/// Every text content item on its own line.
	ToolText,
	/// The `tools/list` catalogue.
	ToolsList,
	/// The editor window table produced by [`crate::lua::list_windows`].
	Windows,
}

/// Error information for failed commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// No usable lock file
	SessionNotFound,
	/// Websocket connect or handshake failed
	ConnectionFailed,
	/// The editor returned an error object
	RemoteError,
	/// The connection failed after it was established
	TransportError,
	InvalidInput,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = match self {
			ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
			ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
			ErrorCode::RemoteError => "REMOTE_ERROR",
			ErrorCode::TransportError => "TRANSPORT_ERROR",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(code)
	}
}

/// Failure envelope printed to stdout in JSON mode.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
	ok: bool,
	error: &'a CommandError,
}

/// Returns the `result` member of a response, or the remote error it carries.
pub fn remote_result(response: &Value) -> Result<&Value> {
	if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
		let message = error
			.get("message")
			.and_then(Value::as_str)
			.unwrap_or("Unknown error")
			.to_string();
		return Err(CliError::Remote {
			code: error.get("code").and_then(Value::as_i64),
			message,
		});
	}
	Ok(response.get("result").unwrap_or(&Value::Null))
}

/// Prints `response` in `format` and fails when it carries an error object.
///
/// In JSON mode the raw response is printed first, so agents see the error
/// object verbatim as well.
pub fn emit_response(response: &Value, render: Render, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => {
			print_json(response)?;
			remote_result(response).map(|_| ())
		}
		OutputFormat::Text => {
			let result = remote_result(response)?;
			let lines = match render {
				Render::ToolText => tool_text_lines(result),
				Render::ToolsList => tools_list_lines(result),
				Render::Windows => windows_lines(result),
			};
			print_lines(&lines)
		}
	}
}

/// Text content of a `tools/call` result, one entry per item.
pub fn tool_text_lines(result: &Value) -> Vec<String> {
	match ToolCallResult::deserialize(result) {
		Ok(parsed) => parsed.texts().map(str::to_owned).collect(),
		Err(err) => {
			debug!(target = "nvctl", error = %err, "result has no tool content");
			Vec::new()
		}
	}
}

pub fn tools_list_lines(result: &Value) -> Vec<String> {
	let Ok(list) = ToolsListResult::deserialize(result) else {
		return tool_text_lines(result);
	};
	let mut lines = Vec::with_capacity(list.tools.len() + 1);
	lines.push("Available tools:".to_string());
	for tool in &list.tools {
		let description = tool.description.as_deref().unwrap_or("No description");
		let short: String = description.chars().take(DESCRIPTION_WIDTH).collect();
		lines.push(format!("  - {}: {short}", tool.name));
	}
	lines
}

/// One row of the editor window table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorWindow {
	pub num: u32,
	pub file: String,
	#[serde(default)]
	pub current: bool,
}

/// Decodes the window table from an `executeCommand` text item.
///
/// The text is a JSON object whose `results[0].result` holds the Lua return
/// value, itself a JSON array, sometimes wrapped in single quotes.
pub fn decode_windows(text: &str) -> std::result::Result<Vec<EditorWindow>, String> {
	let outer: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
	let raw = match outer.get("results").and_then(|r| r.get(0)).and_then(|r| r.get("result")) {
		Some(Value::String(raw)) => raw.as_str(),
		Some(other) => return Err(format!("unexpected result value: {other}")),
		None => "[]",
	};
	let raw = raw
		.strip_prefix('\'')
		.and_then(|r| r.strip_suffix('\''))
		.unwrap_or(raw);
	serde_json::from_str(raw).map_err(|err| err.to_string())
}

pub fn windows_lines(result: &Value) -> Vec<String> {
	let mut lines = Vec::new();
	for text in tool_text_lines(result) {
		match decode_windows(&text) {
			Ok(windows) => {
				lines.push("Editor windows:".to_string());
				for window in windows {
					let marker = if window.current { " <-- current" } else { "" };
					lines.push(format!("  {}: {}{marker}", window.num, display_name(&window.file)));
				}
			}
			Err(err) => {
				lines.push(format!("Parse error: {err}"));
				lines.push(text);
			}
		}
	}
	lines
}

fn display_name(file: &str) -> String {
	if file == "[empty]" {
		return file.to_string();
	}
	Path::new(file)
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| file.to_string())
}

/// A lock file as reported by `sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
	pub port: u16,
	pub path: String,
	/// Seconds since the Unix epoch.
	pub modified: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ide_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pid: Option<u32>,
	pub workspace_folders: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Whether discovery would connect to this session.
	pub selected: bool,
}

impl SessionRow {
	pub fn new(entry: &SessionEntry, selected: Option<u16>) -> Self {
		let modified = entry
			.modified
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs();
		let (ide_name, pid, workspace_folders, error) = match &entry.descriptor {
			Ok(d) => (d.ide_name.clone(), d.pid, d.workspace_folders.clone(), None),
			Err(reason) => (None, None, Vec::new(), Some(reason.clone())),
		};
		Self {
			port: entry.port,
			path: entry.path.display().to_string(),
			modified,
			ide_name,
			pid,
			workspace_folders,
			error,
			selected: selected == Some(entry.port),
		}
	}
}

pub fn session_lines(lock_dir: &Path, rows: &[SessionRow], now: SystemTime) -> Vec<String> {
	if rows.is_empty() {
		return vec![format!("No Neovim sessions in {}", lock_dir.display())];
	}
	let now = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
	let mut lines = vec![format!("Sessions in {}:", lock_dir.display())];
	for row in rows {
		let age = format_age(now.saturating_sub(row.modified));
		let mut line = match &row.error {
			Some(reason) => format!("  {}: unreadable ({reason})", row.port),
			None => {
				let mut line = format!("  {}: {}", row.port, row.ide_name.as_deref().unwrap_or("unknown editor"));
				if let Some(pid) = row.pid {
					line.push_str(&format!(" pid {pid}"));
				}
				if !row.workspace_folders.is_empty() {
					line.push_str(&format!(" [{}]", row.workspace_folders.join(", ")));
				}
				line
			}
		};
		line.push_str(&format!(", updated {age} ago"));
		if row.selected {
			line.push_str(" <-- selected");
		}
		lines.push(line);
	}
	lines
}

fn format_age(secs: u64) -> String {
	match secs {
		0..60 => format!("{secs}s"),
		60..3600 => format!("{}m", secs / 60),
		3600..86400 => format!("{}h", secs / 3600),
		_ => format!("{}d", secs / 86400),
	}
}

pub fn print_lines(lines: &[String]) -> Result<()> {
	let mut stdout = io::stdout().lock();
	for line in lines {
		writeln!(stdout, "{line}")?;
	}
	stdout.flush()?;
	Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
	let mut stdout = io::stdout().lock();
	serde_json::to_writer_pretty(&mut stdout, value)?;
	writeln!(stdout)?;
	stdout.flush()?;
	Ok(())
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error: {}", error.message);
}

/// Prints the `{ok: false, error}` envelope used by JSON mode.
pub fn print_error_json(error: &CommandError) {
	let envelope = ErrorEnvelope { ok: false, error };
	if let Ok(text) = serde_json::to_string_pretty(&envelope) {
		println!("{text}");
	}
}
