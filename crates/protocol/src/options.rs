//! Parameter objects for DevTools commands.

use serde::{Deserialize, Serialize};

/// Parameters for `Page.printToPDF`.
///
/// Every field is optional; unset fields are omitted from the wire so the
/// engine applies its own defaults. Dimensions are in inches.
///
/// See: <https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-printToPDF>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrintToPdfParams {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub landscape: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_header_footer: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub print_background: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scale: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub paper_width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub paper_height: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub margin_top: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub margin_bottom: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub margin_left: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub margin_right: Option<f64>,
	/// Page ranges such as `"1-5, 8, 11-13"`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_ranges: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub header_template: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub footer_template: Option<String>,
	#[serde(default, rename = "preferCSSPageSize", skip_serializing_if = "Option::is_none")]
	pub prefer_css_page_size: Option<bool>,
}

impl PrintToPdfParams {
	/// Sets all four margins to the same value.
	pub fn with_margins(mut self, inches: f64) -> Self {
		self.margin_top = Some(inches);
		self.margin_bottom = Some(inches);
		self.margin_left = Some(inches);
		self.margin_right = Some(inches);
		self
	}
}

/// Parameters for `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	pub expression: String,
	pub await_promise: bool,
	pub return_by_value: bool,
}

impl EvaluateParams {
	pub fn new(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			await_promise: false,
			return_by_value: true,
		}
	}

	pub fn awaiting_promise(mut self) -> Self {
		self.await_promise = true;
		self
	}
}
