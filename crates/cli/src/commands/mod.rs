mod invoke;
mod serve;
mod sessions;

use nvctl_runtime::EnvSnapshot;
use serde_json::{Value, json};

use crate::cli::{Cli, Commands, OpenArgs};
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::lua;
use crate::output::Render;

pub use invoke::Invocation;

/// Runs the parsed command line.
///
/// The environment is captured here, once, and handed down as a snapshot.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::new(&cli, EnvSnapshot::from_process());

	match cli.command {
		Commands::McpServer => serve::execute(&ctx).await,
		Commands::Sessions => sessions::execute(&ctx),
		command => {
			let (invocation, render) = plan(command)?;
			invoke::execute(&ctx, invocation, render).await
		}
	}
}

/// Maps a one-shot subcommand to the remote request and how to print it.
fn plan(command: Commands) -> Result<(Invocation, Render)> {
	let plan = match command {
		Commands::Open(args) => (open_invocation(&args)?, Render::ToolText),
		Commands::Exec { cmd } => (Invocation::call("executeCommand", json!({ "command": cmd })), Render::ToolText),
		Commands::Lua { code } => (Invocation::lua(code), Render::ToolText),
		Commands::ListTools => (Invocation::ListTools, Render::ToolsList),
		Commands::Raw(args) => {
			let arguments: Value = serde_json::from_str(&args.args)
				.map_err(|err| CliError::InvalidInput(format!("--args is not valid JSON: {err}")))?;
			(Invocation::call(args.tool, arguments), Render::ToolText)
		}
		Commands::Windows => (Invocation::lua(lua::list_windows()), Render::Windows),
		Commands::Focus { window } => (Invocation::lua(lua::focus_window(window)), Render::ToolText),
		Commands::CloseWindow { window } => (Invocation::lua(lua::close_window(window)), Render::ToolText),
		Commands::Sessions | Commands::McpServer => {
			return Err(CliError::InvalidInput("not a one-shot command".to_string()));
		}
	};
	Ok(plan)
}

fn open_invocation(args: &OpenArgs) -> Result<Invocation> {
	let path = std::path::absolute(&args.file)?;

	if let Some(window) = args.window {
		return Ok(Invocation::lua(lua::open_in_window(window, &path, args.line)));
	}

	let mut arguments = json!({
		"filePath": path.to_string_lossy(),
		"split": args.split.as_str(),
	});
	if let Some(line) = args.line {
		arguments["startLine"] = json!(line);
	}
	if let Some(end_line) = args.end_line {
		arguments["endLine"] = json!(end_line);
	}
	Ok(Invocation::call("openFile", arguments))
}
