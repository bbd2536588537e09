//! JSON-RPC 2.0 envelopes.
//!
//! One message is carried per websocket frame (or per stdin/stdout line in
//! proxy mode). Requests carry an integer `id`; notifications omit it.
//! Responses carry either `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of the `jsonrpc` version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Generic internal-error code used for bridge-side failures.
pub const INTERNAL_ERROR: i64 = -32603;

/// Request envelope. `id` is [`None`] on notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Always [`JSONRPC_VERSION`].
	pub jsonrpc: String,
	/// Correlation id, absent for notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
	/// Method name.
	pub method: String,
	/// Method parameters.
	#[serde(default)]
	pub params: Value,
}

impl Request {
	/// Builds a request with the given correlation id.
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			id: Some(id),
			method: method.into(),
			params,
		}
	}
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
	/// Numeric error code.
	pub code: i64,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
	/// Optional structured details.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Incoming response.
///
/// `id` stays a raw [`Value`] because the bridge's own synthetic error uses
/// `null`, and peers are free to echo string ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	/// Always [`JSONRPC_VERSION`].
	#[serde(default = "default_version")]
	pub jsonrpc: String,
	/// Echoed request id (`null` when the request could not be identified).
	#[serde(default)]
	pub id: Value,
	/// Success payload.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Failure payload.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorObject>,
}

fn default_version() -> String {
	JSONRPC_VERSION.to_string()
}

impl Response {
	/// Builds the `{"id": null, "error": {"code": -32603, ...}}` response the
	/// bridge emits when it cannot reach the editor at all.
	pub fn internal_error(message: impl Into<String>) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			id: Value::Null,
			result: None,
			error: Some(ErrorObject {
				code: INTERNAL_ERROR,
				message: message.into(),
				data: None,
			}),
		}
	}
}

/// Extracts the integer `id` of a raw message, if any.
///
/// Used to match responses without committing to a full parse of messages
/// that may be notifications or server-initiated requests.
pub fn message_id(message: &Value) -> Option<u64> {
	message.get("id").and_then(Value::as_u64)
}

/// Returns `true` when a raw message is a response (has `result` or `error`).
pub fn is_response(message: &Value) -> bool {
	message.get("result").is_some() || message.get("error").is_some()
}

/// Returns `true` for a response the peer could not tie to a request.
///
/// Parse errors and invalid-request errors carry `"id": null`; some peers
/// drop the field altogether.
pub fn is_unattributed_response(message: &Value) -> bool {
	is_response(message) && message.get("id").is_none_or(Value::is_null)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn request_serializes_with_version_tag() {
		let req = Request::new(1, "initialize", json!({}));
		let value = serde_json::to_value(&req).unwrap();
		assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}));
	}

	#[test]
	fn internal_error_has_null_id_and_generic_code() {
		let resp = Response::internal_error("No Neovim instance found");
		let value = serde_json::to_value(&resp).unwrap();
		assert_eq!(
			value,
			json!({
				"jsonrpc": "2.0",
				"id": null,
				"error": {"code": -32603, "message": "No Neovim instance found"}
			})
		);
	}

	#[test]
	fn response_tolerates_missing_fields() {
		let resp: Response = serde_json::from_str(r#"{"id": 2, "result": {"content": []}}"#).unwrap();
		assert_eq!(resp.jsonrpc, "2.0");
		assert_eq!(resp.id, json!(2));
		assert!(resp.error.is_none());
	}

	#[test]
	fn message_id_ignores_string_ids() {
		assert_eq!(message_id(&json!({"id": 7, "result": {}})), Some(7));
		assert_eq!(message_id(&json!({"id": "7", "result": {}})), None);
		assert_eq!(message_id(&json!({"method": "notifications/progress"})), None);
	}

	#[test]
	fn is_response_distinguishes_notifications() {
		assert!(is_response(&json!({"id": 1, "result": null})));
		assert!(is_response(&json!({"id": 1, "error": {"code": 1, "message": "x"}})));
		assert!(!is_response(&json!({"method": "selection_changed", "params": {}})));
	}

	#[test]
	fn unattributed_response_has_null_or_missing_id() {
		assert!(is_unattributed_response(&json!({"id": null, "error": {"code": -32700, "message": "Parse error"}})));
		assert!(is_unattributed_response(&json!({"error": {"code": -32600, "message": "Invalid Request"}})));
		assert!(!is_unattributed_response(&json!({"id": 2, "result": {}})));
		assert!(!is_unattributed_response(&json!({"method": "notifications/message"})));
	}
}
