//! Bidirectional relay between line-oriented stdio and an editor transport.
//!
//! Two tasks run side by side: inbound forwards each non-empty input line to
//! the transport, outbound writes each transport message followed by `\n`.
//! Neither direction parses or rewrites messages. Input lines that are not
//! valid UTF-8 cannot become websocket text frames and are dropped.
//!
//! The relay finishes when both directions have finished. A genuine failure
//! in either direction aborts the other and is returned immediately. A
//! graceful close (input EOF, editor hang-up) only ends its own direction.

use anyhow::Context as _;
use nvctl_runtime::{TransportReceiver, TransportSender};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Why a direction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionEnd {
	/// The local input reached EOF.
	InputClosed,
	/// The editor closed the connection.
	RemoteClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionReport {
	pub end: DirectionEnd,
	/// Messages relayed in this direction.
	pub messages: u64,
}

/// Outcome of a relay that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
	/// Input to editor.
	pub inbound: DirectionReport,
	/// Editor to output.
	pub outbound: DirectionReport,
}

/// Relays until both directions finish or one fails.
pub async fn run_proxy<I, O, S, R>(input: I, output: O, sender: S, receiver: R) -> Result<RelayReport>
where
	I: AsyncBufRead + Unpin + Send + 'static,
	O: AsyncWrite + Unpin + Send + 'static,
	S: TransportSender + 'static,
	R: TransportReceiver + 'static,
{
	let mut inbound = tokio::spawn(pump_inbound(input, sender));
	let mut outbound = tokio::spawn(pump_outbound(receiver, output));

	let mut inbound_done = None;
	let mut outbound_done = None;

	loop {
		tokio::select! {
			joined = &mut inbound, if inbound_done.is_none() => {
				match settle(joined, "inbound") {
					Ok(report) => {
						debug!(target = "nvctl.relay", ?report, "inbound finished");
						inbound_done = Some(report);
					}
					Err(err) => return Err(abort_sibling(err, &outbound)),
				}
			}
			joined = &mut outbound, if outbound_done.is_none() => {
				match settle(joined, "outbound") {
					Ok(report) => {
						debug!(target = "nvctl.relay", ?report, "outbound finished");
						outbound_done = Some(report);
					}
					Err(err) => return Err(abort_sibling(err, &inbound)),
				}
			}
		}

		if let (Some(sent), Some(received)) = (inbound_done, outbound_done) {
			info!(
				target = "nvctl.relay",
				forwarded = sent.messages,
				delivered = received.messages,
				"relay complete"
			);
			return Ok(RelayReport {
				inbound: sent,
				outbound: received,
			});
		}
	}
}

fn settle(
	joined: std::result::Result<Result<DirectionReport>, tokio::task::JoinError>,
	direction: &str,
) -> Result<DirectionReport> {
	joined.with_context(|| format!("{direction} relay task failed"))?
}

fn abort_sibling(err: CliError, sibling: &JoinHandle<Result<DirectionReport>>) -> CliError {
	warn!(target = "nvctl.relay", error = %err, "relay failed");
	sibling.abort();
	err
}

async fn pump_inbound<I, S>(mut input: I, mut sender: S) -> Result<DirectionReport>
where
	I: AsyncBufRead + Unpin,
	S: TransportSender,
{
	let mut line = Vec::new();
	let mut messages = 0;

	loop {
		line.clear();
		if input.read_until(b'\n', &mut line).await? == 0 {
			return Ok(DirectionReport {
				end: DirectionEnd::InputClosed,
				messages,
			});
		}

		let Ok(text) = std::str::from_utf8(&line) else {
			warn!(target = "nvctl.relay", bytes = line.len(), "skipping input line that is not UTF-8");
			continue;
		};
		let message = text.trim_end();
		if message.is_empty() {
			continue;
		}

		match sender.send(message.to_string()).await {
			Ok(()) => messages += 1,
			Err(err) if err.is_graceful_close() => {
				debug!(target = "nvctl.relay", "editor closed; dropping further input");
				return Ok(DirectionReport {
					end: DirectionEnd::RemoteClosed,
					messages,
				});
			}
			Err(err) => return Err(err.into()),
		}
	}
}

async fn pump_outbound<R, O>(mut receiver: R, mut output: O) -> Result<DirectionReport>
where
	R: TransportReceiver,
	O: AsyncWrite + Unpin,
{
	let mut messages = 0;

	loop {
		let message = match receiver.recv().await {
			Ok(Some(message)) => message,
			Ok(None) => break,
			Err(err) if err.is_graceful_close() => break,
			Err(err) => return Err(err.into()),
		};

		output.write_all(message.as_bytes()).await?;
		output.write_all(b"\n").await?;
		output.flush().await?;
		messages += 1;
	}

	Ok(DirectionReport {
		end: DirectionEnd::RemoteClosed,
		messages,
	})
}
