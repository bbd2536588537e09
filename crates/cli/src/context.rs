//! Shared command context: where to look for sessions and how to connect.

use std::path::PathBuf;
use std::time::Duration;

use nvctl_protocol::ClientInfo;
use nvctl_runtime::{ConnectOptions, EnvSnapshot, SessionLocator, WebSocketChannel, resolve_lock_dir};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::Result;
use crate::output::OutputFormat;

/// Name this client reports in `initialize`.
pub const CLIENT_NAME: &str = "nvim-control";

#[derive(Debug, Clone)]
pub struct CommandContext {
	pub format: OutputFormat,
	env: EnvSnapshot,
	lock_dir: Option<PathBuf>,
	port: Option<u16>,
	connect: ConnectOptions,
}

impl CommandContext {
	pub fn new(cli: &Cli, env: EnvSnapshot) -> Self {
		Self {
			format: cli.format,
			env,
			lock_dir: cli.lock_dir.clone(),
			port: cli.port,
			connect: ConnectOptions {
				connect_timeout: (cli.connect_timeout_ms > 0).then(|| Duration::from_millis(cli.connect_timeout_ms)),
			},
		}
	}

	/// Locator for the resolved lock directory and port hints.
	pub fn locator(&self) -> Result<SessionLocator> {
		let dir = resolve_lock_dir(self.lock_dir.as_deref(), &self.env)?;
		Ok(SessionLocator::new(dir, self.env.clone()).with_port(self.port))
	}

	/// Locates a session and returns a handshaken channel to it.
	pub async fn connect(&self) -> Result<WebSocketChannel> {
		let descriptor = self.locator()?.locate()?;
		info!(target = "nvctl", port = descriptor.port, "connecting to Neovim");
		let client_info = ClientInfo::new(CLIENT_NAME, env!("CARGO_PKG_VERSION"));
		let channel = WebSocketChannel::connect(&descriptor, &self.connect, client_info).await?;
		debug!(
			target = "nvctl",
			server = ?channel.initialize_response().pointer("/result/serverInfo"),
			"editor initialized"
		);
		Ok(channel)
	}
}
