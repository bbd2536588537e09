//! Message transport to the editor's control endpoint.
//!
//! A transport is split into a [`TransportSender`] and a [`TransportReceiver`]
//! so each relay direction can own its half outright. Messages are opaque
//! strings: one JSON-RPC object per websocket text frame.
//!
//! Two implementations exist:
//! - [`websocket`]: the real connection to `ws://127.0.0.1:<port>`
//! - `memory`: an in-process pair driven by a `MemoryPeer`, built for tests
//!   and with the `test-util` feature


#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod websocket;

use async_trait::async_trait;

use crate::error::Result;

/// Sending half of a transport.
#[async_trait]
pub trait TransportSender: Send {
	/// Sends one message. Fails with [`Error::ChannelClosed`](crate::Error::ChannelClosed)
	/// when the peer has already gone away.
	async fn send(&mut self, message: String) -> Result<()>;

	/// Starts a graceful close of the connection.
	async fn close(&mut self) -> Result<()>;
}

/// Receiving half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Waits for the next message.
	///
	/// Returns `Ok(None)` once the peer has closed the connection normally;
	/// abrupt failures are reported as errors.
	async fn recv(&mut self) -> Result<Option<String>>;
}

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryFrame, MemoryPeer, MemoryTransportReceiver, MemoryTransportSender, memory_transport};
pub use websocket::{
	AUTH_HEADER, ConnectOptions, DEFAULT_CONNECT_TIMEOUT, WebSocketTransportReceiver, WebSocketTransportSender,
	connect as connect_websocket,
};
