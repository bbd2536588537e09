//! One-shot invocation: connect, handshake, one request, print, done.

use serde_json::{Value, json};
use tracing::debug;

use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{self, Render};

/// The single request a one-shot command sends after the handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
	/// `tools/call` with the given tool and arguments.
	Call { tool: String, arguments: Value },
	/// `tools/list`.
	ListTools,
}

impl Invocation {
	pub fn call(tool: impl Into<String>, arguments: Value) -> Self {
		Invocation::Call {
			tool: tool.into(),
			arguments,
		}
	}

	/// Runs `code` through the `executeCommand` tool.
	pub fn lua(code: impl Into<String>) -> Self {
		Self::call("executeCommand", json!({ "lua": code.into() }))
	}
}

pub(super) async fn execute(ctx: &CommandContext, invocation: Invocation, render: Render) -> Result<()> {
	let mut channel = ctx.connect().await?;

	let response = match &invocation {
		Invocation::Call { tool, arguments } => {
			debug!(target = "nvctl", tool = %tool, "calling tool");
			channel.call(tool, arguments.clone()).await
		}
		Invocation::ListTools => channel.list_tools().await,
	};

	if let Err(err) = channel.close().await {
		debug!(target = "nvctl", error = %err, "close after call failed");
	}

	output::emit_response(&response?, render, ctx.format)
}
