//! Wire types for the editor control channel.
//!
//! The editor publishes a websocket endpoint that speaks JSON-RPC 2.0 with the
//! MCP method set. This crate holds the serde shapes of the few messages the
//! bridge builds or inspects itself; everything else is relayed as opaque text.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **Lenient on read**: Unknown fields are ignored, optional fields default
//! - **Stable**: Changes only when the wire protocol changes

pub mod jsonrpc;
pub mod mcp;

pub use jsonrpc::*;
pub use mcp::*;
