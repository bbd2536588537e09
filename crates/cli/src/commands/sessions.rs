//! `sessions`: list lock files without connecting to anything.

use std::time::SystemTime;

use nvctl_runtime::Error as RuntimeError;
use tracing::debug;

use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{self, OutputFormat, SessionRow};

pub(super) fn execute(ctx: &CommandContext) -> Result<()> {
	let locator = ctx.locator()?;

	let entries = match locator.list() {
		Ok(entries) => entries,
		Err(RuntimeError::SessionNotFound { .. }) => Vec::new(),
		Err(err) => return Err(err.into()),
	};

	// The session discovery would pick, if any.
	let selected = match locator.locate() {
		Ok(descriptor) => Some(descriptor.port),
		Err(err) => {
			debug!(target = "nvctl.session", error = %err, "no session would be selected");
			None
		}
	};

	let rows: Vec<SessionRow> = entries.iter().map(|entry| SessionRow::new(entry, selected)).collect();

	match ctx.format {
		OutputFormat::Json => output::print_json(&rows),
		OutputFormat::Text => output::print_lines(&output::session_lines(locator.lock_dir(), &rows, SystemTime::now())),
	}
}
