
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nvctl_runtime::DEFAULT_CONNECT_TIMEOUT;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Default bound on websocket connect plus upgrade, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64;

/// Control a running Neovim through claudecode.nvim's websocket server.
#[derive(Parser, Debug)]
#[command(name = "nvim-control")]
#[command(about = "Control Neovim via the claudecode.nvim websocket")]
#[command(version)]
#[command(styles = cli_styles())]
#[command(arg_required_else_help = true)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Connect to the session on this port instead of discovering one
	#[arg(long, global = true, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
	pub port: Option<u16>,

	/// Directory holding session lock files [default: ~/.claude/ide]
	#[arg(long, global = true, value_name = "DIR")]
	pub lock_dir: Option<PathBuf>,

	/// Connect timeout in milliseconds (0 waits indefinitely)
	#[arg(long, global = true, value_name = "MS", default_value_t = DEFAULT_CONNECT_TIMEOUT_MS)]
	pub connect_timeout_ms: u64,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Open a file
	Open(OpenArgs),
	/// Execute a Neovim Ex command
	Exec {
		/// Command to execute
		#[arg(value_name = "CMD", allow_hyphen_values = true)]
		cmd: String,
	},
	/// Execute Lua code
	Lua {
		/// Lua code to execute
		#[arg(value_name = "CODE", allow_hyphen_values = true)]
		code: String,
	},
	/// List available tools
	ListTools,
	/// Call any tool directly
	Raw(RawArgs),
	/// List editor windows
	Windows,
	/// Focus an editor window by number
	Focus {
		/// Window number (1-based)
		#[arg(value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
		window: u32,
	},
	/// Close an editor window by number
	CloseWindow {
		/// Window number (1-based)
		#[arg(value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
		window: u32,
	},
	/// List discovered editor sessions
	Sessions,
	/// Run as a stdio MCP server relaying to the editor
	McpServer,
}

impl Commands {
	/// Returns `true` when stdout carries protocol messages and must not
	/// receive anything else.
	pub fn owns_stdout(&self) -> bool {
		matches!(self, Commands::McpServer)
	}
}

#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
	/// Path to the file
	#[arg(value_name = "FILE")]
	pub file: PathBuf,

	/// Line to jump to
	#[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
	pub line: Option<u32>,

	/// Last line of the selection
	#[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
	pub end_line: Option<u32>,

	/// Where to open the file
	#[arg(short, long, value_enum, default_value = "auto")]
	pub split: SplitMode,

	/// Editor window (1-based) to open the file in
	#[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
	pub window: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct RawArgs {
	/// Tool name
	#[arg(value_name = "TOOL")]
	pub tool: String,

	/// JSON object of tool arguments
	#[arg(short, long, value_name = "JSON", default_value = "{}")]
	pub args: String,
}

/// Placement of a newly opened file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
	Vertical,
	Horizontal,
	None,
	/// Let the editor pick
	#[default]
	Auto,
}

impl SplitMode {
	/// Value of the `split` argument of `openFile`.
	pub fn as_str(self) -> &'static str {
		match self {
			SplitMode::Vertical => "vertical",
			SplitMode::Horizontal => "horizontal",
			SplitMode::None => "none",
			SplitMode::Auto => "auto",
		}
	}
}
