use clap::Parser;
use nvctl_cli::cli::Cli;
use nvctl_cli::error::CliError;
use nvctl_cli::output::{self, OutputFormat};
use nvctl_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	// Stdout belongs to the protocol stream in proxy mode.
	let format = if cli.command.owns_stdout() {
		OutputFormat::Text
	} else {
		cli.format
	};

	let code = match commands::dispatch(cli).await {
		Ok(()) => 0,
		Err(err) => {
			handle_error(&err, format);
			1
		}
	};

	// Exit explicitly: a pending stdin read would otherwise keep the runtime
	// from shutting down.
	std::process::exit(code);
}

fn handle_error(err: &CliError, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	output::print_error_stderr(&cmd_error);

	// Remote errors already printed the raw response in JSON mode.
	if format == OutputFormat::Json && !err.is_remote() {
		output::print_error_json(&cmd_error);
	}
}
