//! `mcp-server`: relay an agent's stdio to the editor's websocket.
//!
//! The bridge completes its own `initialize` exchange before the relay
//! starts, so the proxy only runs on a ready channel. Everything the agent
//! sends afterwards, its own `initialize` included, is relayed untouched.

use std::io::Write;

use nvctl_protocol::Response;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::relay;

pub(super) async fn execute(ctx: &CommandContext) -> Result<()> {
	let channel = match ctx.connect().await {
		Ok(channel) => channel,
		Err(err) => {
			warn!(target = "nvctl", error = %err, "editor session unavailable; reporting to client");
			write_startup_error(&mut std::io::stdout().lock(), &err)?;
			return Ok(());
		}
	};

	info!(target = "nvctl", "relaying stdio to Neovim");
	let (sender, receiver) = channel.into_parts();
	let report = relay::run_proxy(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), sender, receiver).await?;
	info!(target = "nvctl", ?report, "relay finished");
	Ok(())
}

/// Writes the single synthetic error response for a failed startup.
fn write_startup_error(out: &mut impl Write, err: &CliError) -> Result<()> {
	let response = Response::internal_error(err.to_string());
	serde_json::to_writer(&mut *out, &response)?;
	out.write_all(b"\n")?;
	out.flush()?;
	Ok(())
}
