//! Runtime for the editor bridge.
//!
//! This crate provides everything between "which editor?" and "a ready
//! JSON-RPC channel":
//!
//! - **Session discovery**: [`SessionLocator`] resolves a lock file to a
//!   [`SessionDescriptor`] (port + auth token)
//! - **Transport**: websocket halves behind [`TransportSender`] /
//!   [`TransportReceiver`], plus in-memory halves with `test-util`
//! - **Connection**: [`RemoteChannel`] performs the `initialize` handshake and
//!   correlates `tools/call` / `tools/list` responses by id
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  nvctl-cli   │  One-shot commands, stdio proxy
//! └──────┬───────┘
//! ┌──────▼───────┐
//! │ nvctl-runtime│  This crate
//! │  ┌────────┐  │
//! │  │ Locate │  │  Lock file discovery
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Conn   │  │  Handshake, id correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  Websocket / in-memory
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod locator;
pub mod transport;

pub use connection::{HANDSHAKE_ID, RemoteChannel, RequestIds, WebSocketChannel};
pub use error::{Error, Result};
pub use locator::{
	CONTROL_PORT_ENV, EnvSnapshot, LOCK_DIR_ENV, SSE_PORT_ENV, SessionDescriptor, SessionEntry, SessionLocator,
	resolve_lock_dir,
};
pub use transport::{
	AUTH_HEADER, ConnectOptions, DEFAULT_CONNECT_TIMEOUT, TransportReceiver, TransportSender,
	WebSocketTransportReceiver, WebSocketTransportSender, connect_websocket,
};
#[cfg(any(test, feature = "test-util"))]
pub use transport::{MemoryFrame, MemoryPeer, MemoryTransportReceiver, MemoryTransportSender, memory_transport};
