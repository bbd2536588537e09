//! In-process transport.
//!
//! [`memory_transport`] returns the two halves a channel or relay uses plus a
//! [`MemoryPeer`] that plays the editor: it sees every sent message and
//! decides what the receiver gets next, including failures and hang-ups.
//!
//! Only built for tests and behind the `test-util` feature.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::{TransportReceiver, TransportSender};
use crate::error::{Error, Result};

/// What the peer delivers to the receiving half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryFrame {
	/// A message.
	Text(String),
	/// An abrupt transport failure with the given reason.
	Fail(String),
}

/// Creates a connected in-process transport.
pub fn memory_transport() -> (MemoryTransportSender, MemoryTransportReceiver, MemoryPeer) {
	let (sent_tx, sent_rx) = mpsc::unbounded_channel();
	let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
	let (send_failure_tx, send_failure_rx) = watch::channel(None);
	(
		MemoryTransportSender {
			tx: Some(sent_tx),
			failure: send_failure_rx,
		},
		MemoryTransportReceiver { rx: incoming_rx },
		MemoryPeer {
			sent: sent_rx,
			incoming: Some(incoming_tx),
			send_failure: send_failure_tx,
		},
	)
}

pub struct MemoryTransportSender {
	tx: Option<mpsc::UnboundedSender<String>>,
	failure: watch::Receiver<Option<String>>,
}

#[async_trait]
impl TransportSender for MemoryTransportSender {
	async fn send(&mut self, message: String) -> Result<()> {
		let failure = self.failure.borrow().clone();
		if let Some(reason) = failure {
			return Err(Error::TransportError(reason));
		}
		let tx = self.tx.as_ref().ok_or(Error::ChannelClosed)?;
		tx.send(message).map_err(|_| Error::ChannelClosed)
	}

	async fn close(&mut self) -> Result<()> {
		self.tx = None;
		Ok(())
	}
}

pub struct MemoryTransportReceiver {
	rx: mpsc::UnboundedReceiver<MemoryFrame>,
}

#[async_trait]
impl TransportReceiver for MemoryTransportReceiver {
	async fn recv(&mut self) -> Result<Option<String>> {
		match self.rx.recv().await {
			Some(MemoryFrame::Text(text)) => Ok(Some(text)),
			Some(MemoryFrame::Fail(reason)) => Err(Error::TransportError(reason)),
			None => Ok(None),
		}
	}
}

/// The remote end of a [`memory_transport`].
pub struct MemoryPeer {
	sent: mpsc::UnboundedReceiver<String>,
	incoming: Option<mpsc::UnboundedSender<MemoryFrame>>,
	send_failure: watch::Sender<Option<String>>,
}

impl MemoryPeer {
	/// Next message written by the sending half, or [`None`] once it is
	/// closed or dropped.
	pub async fn next_sent(&mut self) -> Option<String> {
		self.sent.recv().await
	}

	/// Message already sent, without waiting.
	pub fn try_next_sent(&mut self) -> Option<String> {
		self.sent.try_recv().ok()
	}

	/// Queues a message for the receiving half. Returns `false` after
	/// [`hang_up`](Self::hang_up) or once the receiver is gone.
	pub fn push(&self, message: impl Into<String>) -> bool {
		self.deliver(MemoryFrame::Text(message.into()))
	}

	/// Makes the receiving half fail with a transport error.
	pub fn fail(&self, reason: impl Into<String>) -> bool {
		self.deliver(MemoryFrame::Fail(reason.into()))
	}

	/// Closes the peer's side: the receiver drains queued messages, then sees
	/// a graceful close.
	pub fn hang_up(&mut self) {
		self.incoming = None;
	}

	/// Stops accepting messages: subsequent sends fail with
	/// [`Error::ChannelClosed`].
	pub fn stop_reading(&mut self) {
		self.sent.close();
	}

	/// Makes every later send fail with a transport error.
	pub fn fail_sends(&self, reason: impl Into<String>) {
		self.send_failure.send_replace(Some(reason.into()));
	}

	fn deliver(&self, frame: MemoryFrame) -> bool {
		self.incoming.as_ref().is_some_and(|tx| tx.send(frame).is_ok())
	}
}
