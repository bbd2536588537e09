//! JSON-RPC channel to an editor session.
//!
//! A [`RemoteChannel`] only exists after the `initialize` exchange has
//! completed: [`RemoteChannel::handshake`] is the sole constructor, so no
//! application request can be sent before the handshake response arrives.
//!
//! # Request ids
//!
//! Ids come from a per-channel counter starting at 1. The handshake always
//! takes id 1; the first call takes id 2. Responses are matched by id, and
//! anything else that arrives while waiting (notifications, stale responses)
//! is skipped. An error response with a null or missing id answers the
//! pending request: only one is ever in flight, and the peer uses that shape
//! when it cannot parse the request.
//!
//! This correlation logic is for the one-shot client only. The stdio proxy
//! handshakes, then relays the raw halves from [`RemoteChannel::into_parts`]
//! and never inspects messages.


use nvctl_protocol::{
	ClientInfo, InitializeParams, METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, Request, ToolCallParams,
	is_response, is_unattributed_response, message_id,
};
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::locator::SessionDescriptor;
use crate::transport::{
	ConnectOptions, TransportReceiver, TransportSender, WebSocketTransportReceiver, WebSocketTransportSender,
	connect_websocket,
};

/// Id reserved for the `initialize` request.
pub const HANDSHAKE_ID: u64 = 1;

/// Monotonic request-id allocator.
#[derive(Debug)]
pub struct RequestIds {
	next: u64,
}

impl RequestIds {
	pub fn new() -> Self {
		Self { next: HANDSHAKE_ID }
	}

	/// Returns the next unused id.
	pub fn allocate(&mut self) -> u64 {
		let id = self.next;
		self.next += 1;
		id
	}
}

impl Default for RequestIds {
	fn default() -> Self {
		Self::new()
	}
}

/// Handshaken channel to an editor session.
pub struct RemoteChannel<S, R> {
	sender: S,
	receiver: R,
	ids: RequestIds,
	initialize_response: Value,
}

/// Channel over the real websocket transport.
pub type WebSocketChannel = RemoteChannel<WebSocketTransportSender, WebSocketTransportReceiver>;

impl WebSocketChannel {
	/// Opens the websocket for `descriptor` and performs the handshake.
	pub async fn connect(descriptor: &SessionDescriptor, options: &ConnectOptions, client_info: ClientInfo) -> Result<Self> {
		let (sender, receiver) = connect_websocket(descriptor, options).await?;
		Self::handshake(sender, receiver, client_info).await
	}
}

impl<S, R> RemoteChannel<S, R>
where
	S: TransportSender,
	R: TransportReceiver,
{
	/// Sends `initialize` (id 1) and waits for its response.
	///
	/// The response content is not validated; any response carrying id 1 is
	/// accepted, including an error response.
	pub async fn handshake(sender: S, receiver: R, client_info: ClientInfo) -> Result<Self> {
		let mut channel = Self {
			sender,
			receiver,
			ids: RequestIds::new(),
			initialize_response: Value::Null,
		};

		let id = channel.ids.allocate();
		let params = serde_json::to_value(InitializeParams::new(client_info))?;
		let response = channel
			.request(id, METHOD_INITIALIZE, params)
			.await
			.map_err(|err| match err {
				Error::ChannelClosed => Error::Handshake("connection closed before initialize response".to_string()),
				Error::TransportError(msg) => Error::Handshake(msg),
				other => other,
			})?;

		debug!(target = "nvctl", "handshake complete");
		channel.initialize_response = response;
		Ok(channel)
	}

	/// Invokes a tool through `tools/call` and returns the raw response.
	///
	/// Error responses are returned as-is; interpreting them is up to the
	/// caller.
	pub async fn call(&mut self, name: &str, arguments: Value) -> Result<Value> {
		let id = self.ids.allocate();
		let params = serde_json::to_value(ToolCallParams {
			name: name.to_string(),
			arguments,
		})?;
		self.request(id, METHOD_TOOLS_CALL, params).await
	}

	/// Queries `tools/list` and returns the raw response.
	pub async fn list_tools(&mut self) -> Result<Value> {
		let id = self.ids.allocate();
		self.request(id, METHOD_TOOLS_LIST, json!({})).await
	}

	/// Response to the `initialize` request.
	pub fn initialize_response(&self) -> &Value {
		&self.initialize_response
	}

	/// Gracefully closes the connection.
	pub async fn close(mut self) -> Result<()> {
		self.sender.close().await
	}

	/// Releases the transport halves.
	pub fn into_parts(self) -> (S, R) {
		(self.sender, self.receiver)
	}

	async fn request(&mut self, id: u64, method: &str, params: Value) -> Result<Value> {
		let request = Request::new(id, method, params);
		let text = serde_json::to_string(&request)?;
		trace!(target = "nvctl", id, method, "sending request");
		self.sender.send(text).await?;

		loop {
			let raw = self.receiver.recv().await?.ok_or(Error::ChannelClosed)?;
			let message: Value = serde_json::from_str(&raw)
				.map_err(|err| Error::ProtocolError(format!("invalid response to {method}: {err}")))?;

			if is_response(&message) && message_id(&message) == Some(id) {
				return Ok(message);
			}
			if is_unattributed_response(&message) {
				debug!(target = "nvctl", waiting_for = id, "accepting response without id");
				return Ok(message);
			}
			debug!(
				target = "nvctl",
				waiting_for = id,
				got = ?message.get("id"),
				method = ?message.get("method"),
				"skipping unrelated message"
			);
		}
	}
}
