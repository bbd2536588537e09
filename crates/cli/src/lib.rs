//! Command-line bridge to a running Neovim via claudecode.nvim.
//!
//! One-shot subcommands (`open`, `exec`, `lua`, `windows`, ...) connect,
//! perform the `initialize` handshake, send one request and print the
//! result. `mcp-server` instead relays newline-delimited JSON-RPC between
//! stdio and the editor's websocket so agents can use the editor as an MCP
//! server.

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod logging;
pub mod lua;
pub mod output;
pub mod relay;
pub mod styles;
