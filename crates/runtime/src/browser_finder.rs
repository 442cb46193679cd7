//! Engine executable discovery for local launches.

use std::path::{Path, PathBuf};

/// Environment variable that overrides discovery.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

/// Locates a Chromium-family executable.
///
/// `CHROME_PATH` wins when it points at an existing file; otherwise
/// well-known install locations and `PATH` commands are tried in order.
pub fn find_engine_executable() -> Option<PathBuf> {
	if let Some(path) = std::env::var_os(CHROME_PATH_ENV).map(PathBuf::from) {
		if path.exists() {
			return Some(path);
		}
	}

	let candidates = if cfg!(target_os = "macos") {
		macos_candidates()
	} else if cfg!(target_os = "windows") {
		windows_candidates()
	} else {
		linux_candidates()
	};

	candidates.into_iter().find_map(|candidate| resolve_candidate(&candidate))
}

fn resolve_candidate(candidate: &str) -> Option<PathBuf> {
	if candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':') {
		let path = Path::new(candidate);
		path.exists().then(|| path.to_path_buf())
	} else {
		which::which(candidate).ok()
	}
}

fn macos_candidates() -> Vec<String> {
	[
		"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
		"/Applications/Chromium.app/Contents/MacOS/Chromium",
		"/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
		"/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

fn linux_candidates() -> Vec<String> {
	[
		"google-chrome-stable",
		"google-chrome",
		"chromium-browser",
		"chromium",
		"microsoft-edge",
		"/usr/bin/google-chrome-stable",
		"/usr/bin/google-chrome",
		"/usr/bin/chromium-browser",
		"/usr/bin/chromium",
		"/snap/bin/chromium",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

pub(crate) fn windows_candidates() -> Vec<String> {
	let mut roots = Vec::new();
	for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
		if let Ok(value) = std::env::var(key) {
			roots.push(PathBuf::from(value));
		}
	}
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
		roots.push(PathBuf::from(r"C:\Program Files (x86)"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Microsoft", "Edge", "Application", "msedge.exe"],
		&["Chromium", "Application", "chrome.exe"],
	];

	let mut candidates: Vec<String> = roots
		.iter()
		.flat_map(|root| {
			suffixes.iter().map(move |suffix| {
				let mut path = root.clone();
				path.extend(suffix.iter());
				path.to_string_lossy().to_string()
			})
		})
		.collect();

	candidates.extend(["chrome.exe", "msedge.exe", "chromium.exe"].map(str::to_string));
	candidates
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn windows_candidates_include_path_commands() {
		let candidates = windows_candidates();
		assert!(candidates.contains(&"chrome.exe".to_string()));
		assert!(candidates.contains(&"msedge.exe".to_string()));
	}

	#[test]
	fn missing_absolute_candidate_is_skipped() {
		assert_eq!(resolve_candidate("/definitely/not/a/browser"), None);
	}
}
