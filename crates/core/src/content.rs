//! Classification of the content handed to `create`.

const URI_SCHEMES: [&str; 4] = ["http:", "https:", "file:", "data:"];

/// Prefix used to wrap raw markup.
pub const HTML_DATA_PREFIX: &str = "data:text/html,";

/// Returns `true` when `content` starts with an http(s), file, or data scheme.
pub fn is_uri(content: &str) -> bool {
	URI_SCHEMES.iter().any(|scheme| {
		content
			.get(..scheme.len())
			.is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
	})
}

/// URL the page is navigated to: URIs pass through unmodified, anything else
/// is treated as markup and wrapped in a `data:` URI.
pub fn navigation_url(content: &str) -> String {
	if is_uri(content) {
		content.to_string()
	} else {
		format!("{HTML_DATA_PREFIX}{content}")
	}
}
