use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};

#[derive(Parser, Debug)]
#[command(name = "htmlpdf")]
#[command(about = "Render HTML or a URL to PDF with a headless Chrome")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8,

	/// URL (http, https, file, data), raw HTML, or `-` to read HTML from stdin
	pub content: String,

	/// Output file; the PDF is written to stdout when omitted
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	/// JSON config file; explicit flags take precedence
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Attach to an engine on this host instead of launching one
	#[arg(long)]
	pub host: Option<String>,

	/// Debugging port: of the remote engine with --host, else of the launched one
	#[arg(long)]
	pub port: Option<u16>,

	/// Chrome/Chromium executable to launch (default: discovered, or $CHROME_PATH)
	#[arg(long, value_name = "PATH")]
	pub chrome_path: Option<PathBuf>,

	/// Extra launch flag, repeatable (e.g. --chrome-flag=--lang=de)
	#[arg(long = "chrome-flag", value_name = "FLAG", allow_hyphen_values = true)]
	pub chrome_flags: Vec<String>,

	/// Launch with a visible window
	#[arg(long)]
	pub headful: bool,

	/// Overall deadline in milliseconds; zero or negative disables it
	#[arg(long, value_name = "MS", allow_negative_numbers = true)]
	pub timeout_ms: Option<i64>,

	/// Clear the browser cache before navigating
	#[arg(long)]
	pub clear_cache: bool,

	/// Cookie set before navigation, repeatable
	#[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_cookie)]
	pub cookies: Vec<(String, String)>,

	/// URL the cookies apply to (defaults to CONTENT when it is a URL)
	#[arg(long, value_name = "URL")]
	pub cookie_url: Option<String>,

	/// Extra HTTP header sent with every request, repeatable
	#[arg(long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
	pub headers: Vec<(String, String)>,

	/// Forward page console messages and exceptions to the log
	#[arg(long)]
	pub log_console: bool,

	#[command(flatten)]
	pub print: PrintArgs,

	#[command(flatten)]
	pub wait: WaitArgs,

	/// Give up on the completion condition after this long
	#[arg(long, value_name = "MS", help_heading = "Completion")]
	pub trigger_timeout_ms: Option<u64>,
}

#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Print")]
pub struct PrintArgs {
	#[arg(long)]
	pub landscape: bool,

	/// Print background graphics
	#[arg(long)]
	pub print_background: bool,

	#[arg(long)]
	pub scale: Option<f64>,

	/// Paper width in inches
	#[arg(long, value_name = "INCHES")]
	pub paper_width: Option<f64>,

	/// Paper height in inches
	#[arg(long, value_name = "INCHES")]
	pub paper_height: Option<f64>,

	/// Margin on all sides in inches
	#[arg(long, value_name = "INCHES")]
	pub margin: Option<f64>,

	/// Pages to print, e.g. "1-5, 8"
	#[arg(long)]
	pub page_ranges: Option<String>,

	/// HTML template for the print header
	#[arg(long, value_name = "HTML")]
	pub header_template: Option<String>,

	/// HTML template for the print footer
	#[arg(long, value_name = "HTML")]
	pub footer_template: Option<String>,

	/// Prefer page size defined by CSS
	#[arg(long)]
	pub prefer_css_page_size: bool,
}

#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Completion")]
#[group(id = "trigger", multiple = false)]
pub struct WaitArgs {
	/// Wait a fixed delay after load
	#[arg(long, value_name = "MS")]
	pub wait_ms: Option<u64>,

	/// Wait for a DOM event on the document
	#[arg(long, value_name = "EVENT")]
	pub wait_event: Option<String>,

	/// Wait until the page calls window[NAME]()
	#[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "htmlPdfCb")]
	pub wait_callback: Option<String>,

	/// Wait until window[NAME] is truthy
	#[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "htmlPdfDone")]
	pub wait_variable: Option<String>,

	/// Wait until a selector matches
	#[arg(long, value_name = "SELECTOR")]
	pub wait_selector: Option<String>,
}

fn parse_cookie(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
		_ => Err(format!("expected NAME=VALUE, got {raw:?}")),
	}
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
	match raw.split_once(':') {
		Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
		_ => Err(format!("expected \"Name: value\", got {raw:?}")),
	}
}
