use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use htmlpdf_cli::cli::Cli;
use htmlpdf_cli::config::{FileConfig, build_options};
use htmlpdf_cli::logging;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

/// Exit status when the request deadline or a completion trigger timed out.
const EXIT_TIMEOUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!(target = "htmlpdf", error = %format!("{err:#}"), "generation failed");
			eprintln!("htmlpdf: {err:#}");
			let timed_out = err.downcast_ref::<htmlpdf::Error>().is_some_and(htmlpdf::Error::is_timeout);
			if timed_out { ExitCode::from(EXIT_TIMEOUT) } else { ExitCode::FAILURE }
		}
	}
}

async fn run(mut cli: Cli) -> Result<()> {
	if cli.content == "-" {
		let mut html = String::new();
		tokio::io::stdin()
			.read_to_string(&mut html)
			.await
			.context("failed to read HTML from stdin")?;
		cli.content = html;
	}

	let file = match &cli.config {
		Some(path) => FileConfig::load(path)?,
		None => FileConfig::default(),
	};
	let options = build_options(&cli, file)?;

	let pdf = htmlpdf::create(&cli.content, &options).await?;

	match &cli.output {
		Some(path) => {
			pdf.to_file(path)
				.await
				.with_context(|| format!("failed to write {}", path.display()))?;
			info!(target = "htmlpdf", path = %path.display(), "wrote pdf");
		}
		None => {
			let bytes = pdf.to_bytes()?;
			let mut stdout = tokio::io::stdout();
			stdout.write_all(&bytes).await.context("failed to write PDF to stdout")?;
			stdout.flush().await?;
		}
	}
	Ok(())
}
