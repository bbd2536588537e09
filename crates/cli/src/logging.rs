use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the global subscriber.
///
/// Logs always go to stderr: in `mcp-server` mode stdout carries the
/// protocol stream and must stay clean. `RUST_LOG` overrides the verbosity
/// flag.
pub fn init_logging(verbosity: u8) {
	// 0 = errors only
	// 1 (-v) = info for the bridge, websocket internals at warn
	// 2+ (-vv) = debug for everything
	let filter = match verbosity {
		0 => "error",
		1 => "info,tungstenite=warn,tokio_tungstenite=warn",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_ansi(false)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
