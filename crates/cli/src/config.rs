//! JSON config file and its merge with command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use htmlpdf::content::is_uri;
use htmlpdf::trigger::{Callback, CompletionTrigger, Element, Event, Timer, Variable};
use htmlpdf::{CookieParam, CreateOptions, PrintToPdfParams};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::{Cli, PrintArgs, WaitArgs};

/// Port assumed for `--host` without `--port`.
pub const DEFAULT_REMOTE_PORT: u16 = 9222;

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub chrome_path: Option<PathBuf>,
	#[serde(default)]
	pub chrome_flags: Vec<String>,
	pub timeout_ms: Option<i64>,
	#[serde(default)]
	pub clear_cache: bool,
	#[serde(default)]
	pub cookies: Vec<CookieParam>,
	#[serde(default)]
	pub extra_http_headers: BTreeMap<String, String>,
	#[serde(default)]
	pub print_options: PrintToPdfParams,
}

impl FileConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
		serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
	}
}

/// Builds request options from the config file, overridden by flags.
///
/// List-valued settings (launch flags, cookies, headers) are merged, with
/// flags last.
pub fn build_options(cli: &Cli, file: FileConfig) -> Result<CreateOptions> {
	let mut options = CreateOptions::new().headless(!cli.headful);

	let host = cli.host.clone().or(file.host);
	let port = cli.port.or(file.port);
	match host {
		Some(host) => options = options.remote(host, port.unwrap_or(DEFAULT_REMOTE_PORT)),
		None => options.launch.port = port,
	}

	options.launch.executable = cli.chrome_path.clone().or(file.chrome_path);
	options.launch.flags = file.chrome_flags;
	options.launch.flags.extend(cli.chrome_flags.iter().cloned());

	if let Some(ms) = cli.timeout_ms.or(file.timeout_ms) {
		options = options.timeout_ms(ms);
	}
	options.clear_cache = cli.clear_cache || file.clear_cache;

	options.cookies = file.cookies;
	if !cli.cookies.is_empty() {
		let url = match (&cli.cookie_url, is_uri(&cli.content)) {
			(Some(url), _) => url.clone(),
			(None, true) => cli.content.clone(),
			(None, false) => bail!("--cookie needs --cookie-url when CONTENT is not a URL"),
		};
		for (name, value) in &cli.cookies {
			options.cookies.push(CookieParam::new(name, value).with_url(url.clone()));
		}
	}

	options.extra_http_headers = file.extra_http_headers;
	for (name, value) in &cli.headers {
		options.extra_http_headers.insert(name.clone(), value.clone());
	}

	options.print_options = print_params(&cli.print, file.print_options);
	options.completion_trigger = completion_trigger(&cli.wait, cli.trigger_timeout_ms.map(Duration::from_millis));

	if cli.log_console {
		options = options
			.on_console(|event| info!(target = "htmlpdf.page", kind = %event.kind, "{}", event.text()))
			.on_exception(|event| warn!(target = "htmlpdf.page", "uncaught: {}", event.exception_details.message()));
	}

	Ok(options)
}

fn print_params(args: &PrintArgs, mut params: PrintToPdfParams) -> PrintToPdfParams {
	if args.landscape {
		params.landscape = Some(true);
	}
	if args.print_background {
		params.print_background = Some(true);
	}
	if args.prefer_css_page_size {
		params.prefer_css_page_size = Some(true);
	}
	if let Some(margin) = args.margin {
		params = params.with_margins(margin);
	}
	params.scale = args.scale.or(params.scale);
	params.paper_width = args.paper_width.or(params.paper_width);
	params.paper_height = args.paper_height.or(params.paper_height);
	params.page_ranges = args.page_ranges.clone().or(params.page_ranges);
	params.header_template = args.header_template.clone().or(params.header_template);
	params.footer_template = args.footer_template.clone().or(params.footer_template);
	if args.header_template.is_some() || args.footer_template.is_some() {
		params.display_header_footer = Some(true);
	}
	params
}

fn completion_trigger(wait: &WaitArgs, timeout: Option<Duration>) -> Option<Arc<dyn CompletionTrigger>> {
	if let Some(ms) = wait.wait_ms {
		return Some(Arc::new(Timer::from_millis(ms)));
	}
	if let Some(event) = &wait.wait_event {
		let trigger = Event::new(event);
		return Some(Arc::new(match timeout {
			Some(t) => trigger.with_timeout(t),
			None => trigger,
		}));
	}
	if let Some(name) = &wait.wait_callback {
		let trigger = Callback::new(name);
		return Some(Arc::new(match timeout {
			Some(t) => trigger.with_timeout(t),
			None => trigger,
		}));
	}
	if let Some(name) = &wait.wait_variable {
		let trigger = Variable::new(name);
		return Some(Arc::new(match timeout {
			Some(t) => trigger.with_timeout(t),
			None => trigger,
		}));
	}
	if let Some(selector) = &wait.wait_selector {
		let trigger = Element::new(selector);
		return Some(Arc::new(match timeout {
			Some(t) => trigger.with_timeout(t),
			None => trigger,
		}));
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	fn cli(args: &[&str]) -> Cli {
		Cli::try_parse_from(std::iter::once("htmlpdf").chain(args.iter().copied())).unwrap()
	}

	#[test]
	fn host_selects_remote_target() {
		let options = build_options(&cli(&["x", "--host", "10.0.0.5"]), FileConfig::default()).unwrap();
		let remote = options.remote.unwrap();
		assert_eq!((remote.host.as_str(), remote.port), ("10.0.0.5", DEFAULT_REMOTE_PORT));
	}

	#[test]
	fn port_without_host_is_launch_hint() {
		let options = build_options(&cli(&["x", "--port", "9333"]), FileConfig::default()).unwrap();
		assert!(options.remote.is_none());
		assert_eq!(options.launch.port, Some(9333));
	}

	#[test]
	fn flags_override_file_values() {
		let file = FileConfig {
			host: Some("file-host".into()),
			timeout_ms: Some(30_000),
			chrome_flags: vec!["--from-file".into()],
			..Default::default()
		};
		let options = build_options(
			&cli(&["x", "--host", "flag-host", "--timeout-ms", "-1", "--chrome-flag=--from-flag"]),
			file,
		)
		.unwrap();
		assert_eq!(options.remote.unwrap().host, "flag-host");
		assert_eq!(options.timeout, None);
		assert_eq!(options.launch.flags, vec!["--from-file".to_string(), "--from-flag".to_string()]);
	}

	#[test]
	fn cookies_default_to_content_url() {
		let options =
			build_options(&cli(&["https://example.test/a", "--cookie", "sid=1"]), FileConfig::default()).unwrap();
		assert_eq!(options.cookies[0].url.as_deref(), Some("https://example.test/a"));
	}

	#[test]
	fn cookies_on_markup_need_a_url() {
		assert!(build_options(&cli(&["<p>x</p>", "--cookie", "sid=1"]), FileConfig::default()).is_err());
		let options = build_options(
			&cli(&["<p>x</p>", "--cookie", "sid=1", "--cookie-url", "https://example.test"]),
			FileConfig::default(),
		)
		.unwrap();
		assert_eq!(options.cookies.len(), 1);
	}

	#[test]
	fn print_flags_layer_over_file_options() {
		let file = FileConfig {
			print_options: PrintToPdfParams {
				scale: Some(0.8),
				page_ranges: Some("1".into()),
				..Default::default()
			},
			..Default::default()
		};
		let options =
			build_options(&cli(&["x", "--landscape", "--page-ranges", "2-3", "--footer-template", "<p/>"]), file)
				.unwrap();
		let print = options.print_options;
		assert_eq!(print.landscape, Some(true));
		assert_eq!(print.scale, Some(0.8));
		assert_eq!(print.page_ranges.as_deref(), Some("2-3"));
		assert_eq!(print.display_header_footer, Some(true));
	}

	#[test]
	fn trigger_flags_map_to_triggers() {
		let options = build_options(&cli(&["x", "--wait-ms", "250"]), FileConfig::default()).unwrap();
		assert!(format!("{:?}", options.completion_trigger).contains("Timer"));
		let options = build_options(
			&cli(&["x", "--wait-selector", "#done", "--trigger-timeout-ms", "500"]),
			FileConfig::default(),
		)
		.unwrap();
		assert!(format!("{:?}", options.completion_trigger).contains("#done"));
		let options = build_options(&cli(&["x"]), FileConfig::default()).unwrap();
		assert!(options.completion_trigger.is_none());
	}
}
