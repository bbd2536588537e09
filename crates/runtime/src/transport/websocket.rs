//! Websocket transport to an editor session.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::{TransportReceiver, TransportSender};
use crate::error::{Error, Result};
use crate::locator::SessionDescriptor;

/// Header carrying the session's auth token on the upgrade request.
pub const AUTH_HEADER: &str = "x-claude-code-ide-authorization";

/// Default bound on opening the websocket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
	/// Upper bound on TCP connect plus websocket upgrade. [`None`] waits
	/// indefinitely. Never applied to reads after the connection is open.
	pub connect_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
	fn default() -> Self {
		Self {
			connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
		}
	}
}

/// Opens the websocket for `descriptor` and splits it into halves.
pub async fn connect(
	descriptor: &SessionDescriptor,
	options: &ConnectOptions,
) -> Result<(WebSocketTransportSender, WebSocketTransportReceiver)> {
	let url = descriptor.ws_url();
	let mut request = url
		.as_str()
		.into_client_request()
		.map_err(|err| Error::ConnectionFailed(format!("invalid endpoint {url}: {err}")))?;
	let token = HeaderValue::from_str(&descriptor.auth_token)
		.map_err(|err| Error::ConnectionFailed(format!("auth token is not a valid header value: {err}")))?;
	request.headers_mut().insert(AUTH_HEADER, token);

	debug!(target = "nvctl", url = %url, "connecting to editor session");

	let connecting = tokio_tungstenite::connect_async(request);
	let result = match options.connect_timeout {
		Some(limit) => tokio::time::timeout(limit, connecting)
			.await
			.map_err(|_| Error::ConnectionFailed(format!("timed out after {}ms connecting to {url}", limit.as_millis())))?,
		None => connecting.await,
	};
	let (stream, response) = result.map_err(|err| Error::ConnectionFailed(describe_connect_error(&err)))?;

	debug!(target = "nvctl", url = %url, status = %response.status(), "websocket connected");

	let (sink, stream) = stream.split();
	Ok((WebSocketTransportSender { sink }, WebSocketTransportReceiver { stream }))
}

fn describe_connect_error(err: &WsError) -> String {
	match err {
		WsError::Http(response) => format!("server rejected connection with HTTP {}", response.status()),
		other => other.to_string(),
	}
}

/// Maps a websocket error on an open connection.
fn map_ws_error(err: WsError) -> Error {
	match err {
		WsError::ConnectionClosed | WsError::AlreadyClosed => Error::ChannelClosed,
		other => Error::TransportError(other.to_string()),
	}
}

/// Sending half of a websocket connection.
pub struct WebSocketTransportSender {
	sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSender for WebSocketTransportSender {
	async fn send(&mut self, message: String) -> Result<()> {
		self.sink.send(Message::Text(message)).await.map_err(map_ws_error)
	}

	async fn close(&mut self) -> Result<()> {
		match self.sink.close().await {
			Ok(()) => Ok(()),
			Err(err) => match map_ws_error(err) {
				Error::ChannelClosed => Ok(()),
				other => Err(other),
			},
		}
	}
}

/// Receiving half of a websocket connection.
pub struct WebSocketTransportReceiver {
	stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportReceiver for WebSocketTransportReceiver {
	async fn recv(&mut self) -> Result<Option<String>> {
		loop {
			let Some(frame) = self.stream.next().await else {
				return Ok(None);
			};
			match frame {
				Ok(Message::Text(text)) => return Ok(Some(text)),
				Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
					Ok(text) => return Ok(Some(text)),
					Err(err) => {
						warn!(target = "nvctl", error = %err, "dropping non-UTF-8 binary frame");
					}
				},
				Ok(Message::Close(frame)) => {
					debug!(target = "nvctl", ?frame, "editor closed the connection");
					return Ok(None);
				}
				// Ping/pong are answered by tungstenite itself.
				Ok(_) => {}
				Err(err) => {
					return match map_ws_error(err) {
						Error::ChannelClosed => Ok(None),
						other => Err(other),
					};
				}
			}
		}
	}
}
