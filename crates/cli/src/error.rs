use nvctl_runtime::Error as RuntimeError;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Runtime(#[from] RuntimeError),

	/// The editor answered the request with a JSON-RPC error object.
	#[error("{message}")]
	Remote { code: Option<i64>, message: String },

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Returns `true` when the failure is a remote error object, whose raw
	/// response has already been written to stdout in JSON mode.
	pub fn is_remote(&self) -> bool {
		matches!(self, CliError::Remote { .. })
	}

	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Runtime(err) if err.is_discovery() => (ErrorCode::SessionNotFound, None),
			CliError::Runtime(err) if err.is_connect() => (ErrorCode::ConnectionFailed, None),
			CliError::Runtime(RuntimeError::Io(_)) => (ErrorCode::IoError, None),
			CliError::Runtime(RuntimeError::Json(_)) => (ErrorCode::InternalError, None),
			CliError::Runtime(_) => (ErrorCode::TransportError, None),
			CliError::Remote { code, .. } => (
				ErrorCode::RemoteError,
				code.map(|code| serde_json::json!({ "code": code })),
			),
			CliError::InvalidInput(_) | CliError::Json(_) => (ErrorCode::InvalidInput, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}
