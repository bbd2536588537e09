//! MCP method names and payload shapes used by the bridge.
//!
//! Only the handshake, `tools/call`, and `tools/list` are modelled. Any other
//! method passes through the proxy without being looked at.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol revision announced in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Handshake method; must be the first request on a channel.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Invokes a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// Lists the tools the editor exposes.
pub const METHOD_TOOLS_LIST: &str = "tools/list";

/// Identity the bridge presents during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
	pub name: String,
	pub version: String,
}

impl ClientInfo {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
		}
	}
}

/// Params of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
	/// Always [`PROTOCOL_VERSION`] for requests built here.
	pub protocol_version: String,
	/// Empty: the bridge advertises no client capabilities.
	pub capabilities: Map<String, Value>,
	pub client_info: ClientInfo,
}

impl InitializeParams {
	pub fn new(client_info: ClientInfo) -> Self {
		Self {
			protocol_version: PROTOCOL_VERSION.to_string(),
			capabilities: Map::new(),
			client_info,
		}
	}
}

/// Params of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
	/// Tool name as listed by `tools/list` (e.g. `openFile`, `executeCommand`).
	pub name: String,
	/// Tool arguments, passed through untouched.
	pub arguments: Value,
}

/// One entry of a `tools/list` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub input_schema: Option<Value>,
}

/// `result` payload of a `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsListResult {
	#[serde(default)]
	pub tools: Vec<ToolInfo>,
}

/// `result` payload of a `tools/call` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
	#[serde(default)]
	pub content: Vec<ContentItem>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_error: Option<bool>,
}

impl ToolCallResult {
	/// Iterates over the text of every `text` content item, in order.
	pub fn texts(&self) -> impl Iterator<Item = &str> {
		self.content.iter().filter_map(ContentItem::as_text)
	}
}

/// Content item of a tool result.
///
/// Only `text` items are interpreted; images, resources, and future kinds are
/// kept as raw JSON so nothing is lost when re-serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
	Text(TextContent),
	Other(Value),
}

/// A `{"type": "text", "text": ...}` content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
	#[serde(rename = "type")]
	pub kind: TextKind,
	pub text: String,
}

/// Discriminator that only accepts `"text"`, so other item kinds fall through
/// to [`ContentItem::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
	Text,
}

impl ContentItem {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			ContentItem::Text(t) => Some(&t.text),
			ContentItem::Other(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn initialize_params_use_camel_case_and_empty_capabilities() {
		let params = InitializeParams::new(ClientInfo::new("nvim-control", "1.0"));
		let value = serde_json::to_value(&params).unwrap();
		assert_eq!(
			value,
			json!({
				"protocolVersion": "2024-11-05",
				"capabilities": {},
				"clientInfo": {"name": "nvim-control", "version": "1.0"}
			})
		);
	}

	#[test]
	fn tool_call_result_keeps_non_text_items() {
		let result: ToolCallResult = serde_json::from_value(json!({
			"content": [
				{"type": "text", "text": "first"},
				{"type": "image", "data": "AAAA", "mimeType": "image/png"},
				{"type": "text", "text": "second"}
			]
		}))
		.unwrap();

		assert_eq!(result.content.len(), 3);
		assert!(matches!(result.content[1], ContentItem::Other(_)));
		assert_eq!(result.texts().collect::<Vec<_>>(), vec!["first", "second"]);
	}

	#[test]
	fn tools_list_tolerates_missing_description() {
		let result: ToolsListResult = serde_json::from_value(json!({
			"tools": [
				{"name": "openFile", "description": "Open a file", "inputSchema": {"type": "object"}},
				{"name": "getDiagnostics"}
			]
		}))
		.unwrap();

		assert_eq!(result.tools[0].description.as_deref(), Some("Open a file"));
		assert!(result.tools[1].description.is_none());
	}
}
