//! Result and event payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mirror object referencing a page-side JavaScript value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub class_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unserializable_value: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl RemoteObject {
	/// JavaScript truthiness of the mirrored value.
	pub fn is_truthy(&self) -> bool {
		match self.kind.as_str() {
			"undefined" => false,
			"object" if self.subtype.as_deref() == Some("null") => false,
			"object" | "function" | "symbol" => true,
			"bigint" => !matches!(self.unserializable_value.as_deref(), Some("0n") | Some("-0n")),
			"number" if self.unserializable_value.is_some() => {
				!matches!(self.unserializable_value.as_deref(), Some("NaN") | Some("-0"))
			}
			_ => match &self.value {
				None | Some(Value::Null) => false,
				Some(Value::Bool(b)) => *b,
				Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
				Some(Value::String(s)) => !s.is_empty(),
				Some(Value::Array(_)) | Some(Value::Object(_)) => true,
			},
		}
	}

	/// Human-readable rendering used for console output.
	pub fn display(&self) -> String {
		match &self.value {
			Some(Value::String(s)) => s.clone(),
			Some(v) => v.to_string(),
			None => self
				.description
				.clone()
				.or_else(|| self.unserializable_value.clone())
				.unwrap_or_else(|| self.kind.clone()),
		}
	}
}

/// Detailed information about a page-side exception.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	#[serde(default)]
	pub exception_id: i64,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub line_number: i64,
	#[serde(default)]
	pub column_number: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best available message: the thrown value's description, else the summary text.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.clone().or_else(|| e.value.as_ref().map(|v| match v {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			})))
			.unwrap_or_else(|| self.text.clone())
	}
}

/// Result of `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<ExceptionDetails>,
}

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	#[serde(default)]
	pub frame_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub loader_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_text: Option<String>,
}

/// Result of `Page.printToPDF`; `data` is base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrintToPdfResult {
	pub data: String,
}

/// Payload of `Runtime.consoleAPICalled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalled {
	/// Console call type: `log`, `warning`, `error`, ...
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub args: Vec<RemoteObject>,
	#[serde(default)]
	pub execution_context_id: i64,
	#[serde(default)]
	pub timestamp: f64,
}

impl ConsoleApiCalled {
	/// Arguments joined with spaces, as a console would print them.
	pub fn text(&self) -> String {
		self.args.iter().map(RemoteObject::display).collect::<Vec<_>>().join(" ")
	}
}

/// Payload of `Runtime.exceptionThrown`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionThrown {
	#[serde(default)]
	pub timestamp: f64,
	pub exception_details: ExceptionDetails,
}

/// `/json/version` response subset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionInfo {
	#[serde(rename = "Browser", default)]
	pub browser: Option<String>,
	#[serde(rename = "Protocol-Version", default)]
	pub protocol_version: Option<String>,
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
}

/// Target entry returned by `/json/new` and `/json/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
	pub id: String,
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub web_socket_debugger_url: Option<String>,
}
