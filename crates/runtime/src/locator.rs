//! Session discovery from editor lock files.
//!
//! Every running editor session writes `<lock_dir>/<port>.lock`, a JSON file
//! holding at least an `authToken`. Discovery is a pure function of an
//! explicit lock directory and an [`EnvSnapshot`] captured once at the
//! process edge, so tests can point it at a temporary directory.
//!
//! Resolution order:
//!
//! 1. A port hint (explicit override, then `CLAUDE_CODE_SSE_PORT`, then
//!    `NVIM_CONTROL_PORT`) selects exactly `<port>.lock`. If that file is
//!    missing or corrupt, discovery fails; it never falls back to another
//!    session.
//! 2. Without a hint, the lock file with the newest modification time wins.
//!    Ties go to the lexicographically smallest file name.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Extension of session lock files.
pub const LOCK_FILE_EXTENSION: &str = "lock";
/// Port of the session that launched this process, set by the hosting editor.
pub const SSE_PORT_ENV: &str = "CLAUDE_CODE_SSE_PORT";
/// Manual port override.
pub const CONTROL_PORT_ENV: &str = "NVIM_CONTROL_PORT";
/// Overrides the lock directory.
pub const LOCK_DIR_ENV: &str = "NVIM_CONTROL_LOCK_DIR";

/// Lock directory relative to the home directory.
const DEFAULT_LOCK_SUBDIR: [&str; 2] = [".claude", "ide"];

/// Environment inputs to discovery, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
	/// Value of [`SSE_PORT_ENV`].
	pub sse_port: Option<String>,
	/// Value of [`CONTROL_PORT_ENV`].
	pub control_port: Option<String>,
	/// Value of [`LOCK_DIR_ENV`].
	pub lock_dir: Option<PathBuf>,
	/// Home directory of the current user.
	pub home_dir: Option<PathBuf>,
}

impl EnvSnapshot {
	/// Captures the relevant variables from the process environment.
	///
	/// Empty values are treated as unset.
	pub fn from_process() -> Self {
		let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
		Self {
			sse_port: var(SSE_PORT_ENV),
			control_port: var(CONTROL_PORT_ENV),
			lock_dir: var(LOCK_DIR_ENV).map(PathBuf::from),
			home_dir: dirs::home_dir(),
		}
	}

	/// Returns the first port hint present, with the name of its variable.
	fn port_hint(&self) -> Option<(&str, &'static str)> {
		self.sse_port
			.as_deref()
			.map(|v| (v, SSE_PORT_ENV))
			.or_else(|| self.control_port.as_deref().map(|v| (v, CONTROL_PORT_ENV)))
	}
}

/// Resolves the lock directory: explicit path, then [`LOCK_DIR_ENV`], then
/// `~/.claude/ide`.
pub fn resolve_lock_dir(explicit: Option<&Path>, env: &EnvSnapshot) -> Result<PathBuf> {
	if let Some(dir) = explicit {
		return Ok(dir.to_path_buf());
	}
	if let Some(dir) = &env.lock_dir {
		return Ok(dir.clone());
	}
	let home = env
		.home_dir
		.as_ref()
		.ok_or_else(|| Error::Config(format!("cannot determine home directory; set {LOCK_DIR_ENV}")))?;
	Ok(DEFAULT_LOCK_SUBDIR.iter().fold(home.clone(), |acc, part| acc.join(part)))
}

/// On-disk lock file contents. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockFile {
	auth_token: String,
	#[serde(default)]
	pid: Option<u32>,
	#[serde(default)]
	workspace_folders: Vec<String>,
	#[serde(default)]
	ide_name: Option<String>,
	#[serde(default)]
	transport: Option<String>,
}

/// A live editor session: where to connect and how to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
	/// Websocket port on 127.0.0.1.
	pub port: u16,
	/// Value for the authorization header.
	pub auth_token: String,
	/// PID of the editor that wrote the lock file.
	pub pid: Option<u32>,
	/// Workspace folders the editor reported.
	pub workspace_folders: Vec<String>,
	/// Editor name (e.g. `Neovim`).
	pub ide_name: Option<String>,
	/// Transport advertised by the editor (e.g. `ws`).
	pub transport: Option<String>,
	/// Lock file this descriptor was read from.
	pub path: PathBuf,
}

impl fmt::Debug for SessionDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionDescriptor")
			.field("port", &self.port)
			.field("auth_token", &"<redacted>")
			.field("pid", &self.pid)
			.field("workspace_folders", &self.workspace_folders)
			.field("ide_name", &self.ide_name)
			.field("transport", &self.transport)
			.field("path", &self.path)
			.finish()
	}
}

impl SessionDescriptor {
	/// Reads and validates the lock file at `path` for `port`.
	pub fn load(path: &Path, port: u16) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(|err| Error::SessionCorrupt {
			path: path.to_path_buf(),
			reason: err.to_string(),
		})?;
		Self::parse(&content, path, port)
	}

	fn parse(content: &str, path: &Path, port: u16) -> Result<Self> {
		let lock: LockFile = serde_json::from_str(content).map_err(|err| Error::SessionCorrupt {
			path: path.to_path_buf(),
			reason: err.to_string(),
		})?;
		if lock.auth_token.is_empty() {
			return Err(Error::SessionCorrupt {
				path: path.to_path_buf(),
				reason: "empty authToken".to_string(),
			});
		}
		Ok(Self {
			port,
			auth_token: lock.auth_token,
			pid: lock.pid,
			workspace_folders: lock.workspace_folders,
			ide_name: lock.ide_name,
			transport: lock.transport,
			path: path.to_path_buf(),
		})
	}

	/// Websocket URL of the session.
	pub fn ws_url(&self) -> String {
		format!("ws://127.0.0.1:{}", self.port)
	}
}

/// Parses `<port>.lock` into its port.
pub fn parse_lock_file_name(name: &str) -> Option<u16> {
	let stem = name.strip_suffix(LOCK_FILE_EXTENSION)?.strip_suffix('.')?;
	if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	stem.parse::<u16>().ok().filter(|port| *port != 0)
}

fn parse_port_hint(value: &str, source_name: &'static str) -> Result<u16> {
	value
		.trim()
		.parse::<u16>()
		.ok()
		.filter(|port| *port != 0)
		.ok_or_else(|| Error::InvalidPortHint {
			value: value.to_string(),
			source_name,
		})
}

/// A lock file found in the lock directory.
#[derive(Debug, Clone)]
pub struct SessionEntry {
	pub port: u16,
	pub path: PathBuf,
	pub modified: SystemTime,
	/// Parsed descriptor, or why it could not be parsed.
	pub descriptor: std::result::Result<SessionDescriptor, String>,
}

#[derive(Debug)]
struct Candidate {
	port: u16,
	path: PathBuf,
	name: String,
	modified: SystemTime,
}

/// Finds editor sessions in a lock directory.
#[derive(Debug, Clone)]
pub struct SessionLocator {
	lock_dir: PathBuf,
	env: EnvSnapshot,
	port_override: Option<u16>,
}

impl SessionLocator {
	pub fn new(lock_dir: impl Into<PathBuf>, env: EnvSnapshot) -> Self {
		Self {
			lock_dir: lock_dir.into(),
			env,
			port_override: None,
		}
	}

	/// Sets an explicit port that takes precedence over the environment hints.
	pub fn with_port(mut self, port: Option<u16>) -> Self {
		self.port_override = port;
		self
	}

	pub fn lock_dir(&self) -> &Path {
		&self.lock_dir
	}

	/// Path of the lock file for `port`.
	pub fn lock_path(&self, port: u16) -> PathBuf {
		self.lock_dir.join(format!("{port}.{LOCK_FILE_EXTENSION}"))
	}

	/// Locates the session to connect to.
	pub fn locate(&self) -> Result<SessionDescriptor> {
		if let Some(port) = self.port_override {
			return self.locate_hinted(port, "--port");
		}
		if let Some((value, source_name)) = self.env.port_hint() {
			let port = parse_port_hint(value, source_name)?;
			return self.locate_hinted(port, source_name);
		}
		self.locate_most_recent()
	}

	fn locate_hinted(&self, port: u16, source_name: &str) -> Result<SessionDescriptor> {
		let path = self.lock_path(port);
		debug!(target = "nvctl.session", port, source = source_name, path = %path.display(), "using hinted session");
		match fs::metadata(&path) {
			Ok(_) => SessionDescriptor::load(&path, port),
			Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::HintedSessionMissing { port, path }),
			Err(err) => Err(Error::SessionCorrupt {
				path,
				reason: err.to_string(),
			}),
		}
	}

	fn locate_most_recent(&self) -> Result<SessionDescriptor> {
		let candidates = self.scan()?;
		let newest = candidates.into_iter().next().ok_or_else(|| Error::SessionNotFound {
			dir: self.lock_dir.clone(),
		})?;
		debug!(target = "nvctl.session", port = newest.port, path = %newest.path.display(), "using most recent session");
		SessionDescriptor::load(&newest.path, newest.port)
	}

	/// Lists every lock file, newest first, with its parse status.
	pub fn list(&self) -> Result<Vec<SessionEntry>> {
		Ok(self
			.scan()?
			.into_iter()
			.map(|c| SessionEntry {
				descriptor: SessionDescriptor::load(&c.path, c.port).map_err(|err| err.to_string()),
				port: c.port,
				path: c.path,
				modified: c.modified,
			})
			.collect())
	}

	/// Lock files sorted newest first, ties by file name.
	fn scan(&self) -> Result<Vec<Candidate>> {
		let entries = match fs::read_dir(&self.lock_dir) {
			Ok(entries) => entries,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				return Err(Error::SessionNotFound {
					dir: self.lock_dir.clone(),
				});
			}
			Err(err) => {
				return Err(Error::Config(format!(
					"cannot read lock directory {}: {err}",
					self.lock_dir.display()
				)));
			}
		};

		let mut candidates = Vec::new();
		for entry in entries.flatten() {
			let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
				continue;
			};
			let Some(port) = parse_lock_file_name(&name) else {
				continue;
			};
			// Lock files can vanish between listing and stat when a session exits.
			let Ok(meta) = entry.metadata() else {
				continue;
			};
			if !meta.is_file() {
				continue;
			}
			let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
			candidates.push(Candidate {
				port,
				path: entry.path(),
				name,
				modified,
			});
		}

		candidates.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
		Ok(candidates)
	}
}

#[cfg(test)]
mod tests {
	use std::fs::File;
	use std::time::Duration;

	use tempfile::tempdir;

	use super::*;

	fn write_lock(dir: &Path, port: u16, token: &str, mtime_secs: u64) -> PathBuf {
		let path = dir.join(format!("{port}.lock"));
		let body = serde_json::json!({
			"pid": 4242,
			"workspaceFolders": ["/home/user/project"],
			"ideName": "Neovim",
			"transport": "ws",
			"authToken": token,
		});
		fs::write(&path, body.to_string()).unwrap();
		set_mtime(&path, mtime_secs);
		path
	}

	fn set_mtime(path: &Path, secs: u64) {
		let file = File::options().write(true).open(path).unwrap();
		file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
	}

	#[test]
	fn most_recent_lock_file_wins() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "old", 1_000);
		write_lock(dir.path(), 200, "new", 2_000);

		let locator = SessionLocator::new(dir.path(), EnvSnapshot::default());
		let descriptor = locator.locate().unwrap();
		assert_eq!(descriptor.port, 200);
		assert_eq!(descriptor.auth_token, "new");
		assert_eq!(descriptor.ide_name.as_deref(), Some("Neovim"));
	}

	#[test]
	fn mtime_ties_break_on_file_name() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 300, "three", 5_000);
		write_lock(dir.path(), 1200, "twelve", 5_000);

		let locator = SessionLocator::new(dir.path(), EnvSnapshot::default());
		// "1200.lock" < "300.lock" lexicographically.
		assert_eq!(locator.locate().unwrap().port, 1200);
	}

	#[test]
	fn hint_selects_exact_port_even_when_older() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "hinted", 1_000);
		write_lock(dir.path(), 200, "newer", 2_000);

		let env = EnvSnapshot {
			sse_port: Some("100".into()),
			..Default::default()
		};
		let descriptor = SessionLocator::new(dir.path(), env).locate().unwrap();
		assert_eq!(descriptor.port, 100);
		assert_eq!(descriptor.auth_token, "hinted");
	}

	#[test]
	fn sse_port_takes_precedence_over_control_port() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "sse", 1_000);
		write_lock(dir.path(), 200, "control", 2_000);

		let env = EnvSnapshot {
			sse_port: Some("100".into()),
			control_port: Some("200".into()),
			..Default::default()
		};
		assert_eq!(SessionLocator::new(dir.path(), env).locate().unwrap().port, 100);
	}

	#[test]
	fn explicit_port_overrides_environment() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "env", 1_000);
		write_lock(dir.path(), 300, "flag", 500);

		let env = EnvSnapshot {
			sse_port: Some("100".into()),
			..Default::default()
		};
		let locator = SessionLocator::new(dir.path(), env).with_port(Some(300));
		assert_eq!(locator.locate().unwrap().auth_token, "flag");
	}

	#[test]
	fn missing_hinted_file_fails_without_fallback() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 200, "other", 2_000);

		let env = EnvSnapshot {
			control_port: Some("999".into()),
			..Default::default()
		};
		let err = SessionLocator::new(dir.path(), env).locate().unwrap_err();
		assert!(matches!(err, Error::HintedSessionMissing { port: 999, .. }), "unexpected error: {err}");
	}

	#[test]
	fn corrupt_hinted_file_fails_without_fallback() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("100.lock"), "{not json").unwrap();
		write_lock(dir.path(), 200, "other", 2_000);

		let env = EnvSnapshot {
			sse_port: Some("100".into()),
			..Default::default()
		};
		let err = SessionLocator::new(dir.path(), env).locate().unwrap_err();
		assert!(matches!(err, Error::SessionCorrupt { .. }), "unexpected error: {err}");
	}

	#[test]
	fn invalid_port_hint_is_rejected() {
		let dir = tempdir().unwrap();
		let env = EnvSnapshot {
			sse_port: Some("not-a-port".into()),
			..Default::default()
		};
		let err = SessionLocator::new(dir.path(), env).locate().unwrap_err();
		assert!(matches!(err, Error::InvalidPortHint { source_name: SSE_PORT_ENV, .. }));
	}

	#[test]
	fn empty_directory_is_not_found() {
		let dir = tempdir().unwrap();
		fs::write(dir.path().join("notes.txt"), "x").unwrap();
		let err = SessionLocator::new(dir.path(), EnvSnapshot::default()).locate().unwrap_err();
		assert!(matches!(err, Error::SessionNotFound { .. }));
	}

	#[test]
	fn missing_directory_is_not_found() {
		let dir = tempdir().unwrap();
		let locator = SessionLocator::new(dir.path().join("absent"), EnvSnapshot::default());
		assert!(matches!(locator.locate().unwrap_err(), Error::SessionNotFound { .. }));
	}

	#[test]
	fn newest_file_without_token_is_corrupt() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "ok", 1_000);
		let path = dir.path().join("200.lock");
		fs::write(&path, r#"{"pid": 1, "ideName": "Neovim"}"#).unwrap();
		set_mtime(&path, 2_000);

		let err = SessionLocator::new(dir.path(), EnvSnapshot::default()).locate().unwrap_err();
		match err {
			Error::SessionCorrupt { path: p, reason } => {
				assert_eq!(p, path);
				assert!(reason.contains("authToken"), "reason: {reason}");
			}
			other => panic!("expected SessionCorrupt, got {other}"),
		}
	}

	#[test]
	fn list_reports_every_session_newest_first() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "a", 1_000);
		write_lock(dir.path(), 200, "b", 3_000);
		let broken = dir.path().join("300.lock");
		fs::write(&broken, "").unwrap();
		set_mtime(&broken, 2_000);

		let entries = SessionLocator::new(dir.path(), EnvSnapshot::default()).list().unwrap();
		let ports: Vec<u16> = entries.iter().map(|e| e.port).collect();
		assert_eq!(ports, vec![200, 300, 100]);
		assert!(entries[0].descriptor.is_ok());
		assert!(entries[1].descriptor.is_err());
	}

	#[test]
	fn lock_file_names_parse_to_ports() {
		assert_eq!(parse_lock_file_name("12345.lock"), Some(12345));
		assert_eq!(parse_lock_file_name("0.lock"), None);
		assert_eq!(parse_lock_file_name("70000.lock"), None);
		assert_eq!(parse_lock_file_name("+80.lock"), None);
		assert_eq!(parse_lock_file_name("abc.lock"), None);
		assert_eq!(parse_lock_file_name("12345.lock.bak"), None);
		assert_eq!(parse_lock_file_name(".lock"), None);
	}

	#[test]
	fn lock_dir_resolution_order() {
		let env = EnvSnapshot {
			lock_dir: Some(PathBuf::from("/env/locks")),
			home_dir: Some(PathBuf::from("/home/user")),
			..Default::default()
		};
		assert_eq!(
			resolve_lock_dir(Some(Path::new("/flag/locks")), &env).unwrap(),
			PathBuf::from("/flag/locks")
		);
		assert_eq!(resolve_lock_dir(None, &env).unwrap(), PathBuf::from("/env/locks"));

		let home_only = EnvSnapshot {
			home_dir: Some(PathBuf::from("/home/user")),
			..Default::default()
		};
		assert_eq!(
			resolve_lock_dir(None, &home_only).unwrap(),
			PathBuf::from("/home/user/.claude/ide")
		);
		assert!(matches!(resolve_lock_dir(None, &EnvSnapshot::default()), Err(Error::Config(_))));
	}

	#[test]
	fn debug_output_redacts_token() {
		let dir = tempdir().unwrap();
		write_lock(dir.path(), 100, "super-secret", 1_000);
		let descriptor = SessionLocator::new(dir.path(), EnvSnapshot::default()).locate().unwrap();
		assert!(!format!("{descriptor:?}").contains("super-secret"));
		assert_eq!(descriptor.ws_url(), "ws://127.0.0.1:100");
	}
}
