//! Error types for the bridge runtime.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering, connecting to, or talking with an
/// editor session.
#[derive(Debug, Error)]
pub enum Error {
	/// No lock file exists in the lock directory.
	#[error("No Neovim instance found (no lock files in {}). Make sure claudecode.nvim is running (:ClaudeCodeStart)", dir.display())]
	SessionNotFound { dir: PathBuf },

	/// A port hint was given but its lock file does not exist.
	#[error("No Neovim instance found on port {port} ({} does not exist). Make sure claudecode.nvim is running (:ClaudeCodeStart)", path.display())]
	HintedSessionMissing { port: u16, path: PathBuf },

	/// A port hint was given but is not a valid TCP port.
	#[error("Invalid port hint {value:?} from {source_name}")]
	InvalidPortHint { value: String, source_name: &'static str },

	/// A lock file exists but cannot be read or parsed.
	#[error("Session file {} is corrupt: {reason}", path.display())]
	SessionCorrupt { path: PathBuf, reason: String },

	/// Bridge configuration could not be resolved.
	#[error("Configuration error: {0}")]
	Config(String),

	/// Failed to open or authenticate the websocket connection.
	#[error("Failed to connect to Neovim: {0}")]
	ConnectionFailed(String),

	/// The `initialize` exchange did not complete.
	#[error("Handshake failed: {0}")]
	Handshake(String),

	/// Transport-level failure on an established connection.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// The connection was closed by the peer.
	#[error("Connection closed")]
	ChannelClosed,

	/// A message could not be interpreted as JSON-RPC.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` for failures to find or read a session descriptor.
	pub fn is_discovery(&self) -> bool {
		matches!(
			self,
			Error::SessionNotFound { .. }
				| Error::HintedSessionMissing { .. }
				| Error::InvalidPortHint { .. }
				| Error::SessionCorrupt { .. }
				| Error::Config(_)
		)
	}

	/// Returns `true` for failures to establish the connection.
	pub fn is_connect(&self) -> bool {
		matches!(self, Error::ConnectionFailed(_) | Error::Handshake(_))
	}

	/// Returns `true` when the peer closed the connection normally.
	pub fn is_graceful_close(&self) -> bool {
		matches!(self, Error::ChannelClosed)
	}
}
