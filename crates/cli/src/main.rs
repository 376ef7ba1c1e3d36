//! `livepane` binary.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use livepane_session::Config;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = Config::load_or_default(cli.config.as_deref()).context("loading configuration")?;

	match cli.command {
		Command::Preview { files, wait_ms, json } => commands::preview(config, &files, Duration::from_millis(wait_ms), json).await,
		Command::Assemble { files } => commands::assemble_files(&files),
		Command::Exec { file, language } => commands::exec(&config, &file, language.as_deref()),
		Command::Watch { files, interval_ms } => commands::watch(config, &files, Duration::from_millis(interval_ms)).await,
		Command::Fmt { file, write } => commands::fmt(&file, write),
		Command::Lint { file } => commands::lint(&file),
	}
}

fn setup_tracing(verbose: u8) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
		0 => EnvFilter::new("warn"),
		1 => EnvFilter::new("livepane=debug,info"),
		_ => EnvFilter::new("livepane=trace,debug"),
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
