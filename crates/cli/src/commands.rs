use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use livepane_bridge::{LogEntry, RelayedSignal, RunOutcome};
use livepane_document::file::load_buffer;
use livepane_document::tidy::{format_source, lint_source};
use livepane_document::{SourceBuffer, assemble};
use livepane_host::execute_with_timeout;
use livepane_session::{Config, PreviewSession, RebuildOutcome};

fn load_buffers(files: &[PathBuf]) -> Result<Vec<SourceBuffer>> {
	files.iter().map(|path| load_buffer(path).map_err(Into::into)).collect()
}

fn render(entry: &LogEntry, json: bool) -> Result<String> {
	if json {
		return serde_json::to_string(entry).context("serializing log entry");
	}
	Ok(match &entry.signal {
		RelayedSignal::Console { level, text } => format!("[{level}] {text}"),
		RelayedSignal::Error { text, line, column } => format!("[error {line}:{column}] {text}"),
	})
}

pub async fn preview(config: Config, files: &[PathBuf], wait: Duration, json: bool) -> Result<ExitCode> {
	let buffers = load_buffers(files)?;
	let session = PreviewSession::start(config);
	let RebuildOutcome::Reloaded { generation } = session.sync(&buffers)? else {
		anyhow::bail!("fresh session reported an unchanged document");
	};

	match tokio::time::timeout(wait, session.wait_settled(generation)).await {
		Ok(RunOutcome::Completed { scripts, timers }) => tracing::debug!(scripts, timers, "preview settled"),
		Ok(outcome) => tracing::warn!(?outcome, "preview did not complete"),
		Err(_) => tracing::warn!(wait_ms = wait.as_millis(), "preview still running; printing what arrived"),
	}

	for entry in session.relay().since(0) {
		println!("{}", render(&entry, json)?);
	}
	for diagnostic in session.diagnostics() {
		eprintln!("script:{}:{}: {}", diagnostic.line, diagnostic.column, diagnostic.message);
	}
	let failed = !session.relay().errors().is_empty();
	session.shutdown().await;
	Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

pub fn assemble_files(files: &[PathBuf]) -> Result<ExitCode> {
	let buffers = load_buffers(files)?;
	print!("{}", assemble(&buffers));
	Ok(ExitCode::SUCCESS)
}

pub fn exec(config: &Config, file: &Path, language: Option<&str>) -> Result<ExitCode> {
	let buffer = load_buffer(file)?;
	let language = language.unwrap_or(buffer.language.as_str());
	let result = execute_with_timeout(&buffer.content, language, &config.host, config.execute.timeout());
	print!("{}", result.output);
	match result.error {
		Some(error) => {
			eprintln!("error: {error}");
			Ok(ExitCode::FAILURE)
		}
		None => Ok(ExitCode::SUCCESS),
	}
}

pub async fn watch(config: Config, files: &[PathBuf], interval: Duration) -> Result<ExitCode> {
	let session = PreviewSession::start(config);
	let mut ticker = tokio::time::interval(interval);
	let mut last_seq = 0;

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break,
			_ = ticker.tick() => {}
		}
		match load_buffers(files) {
			Ok(buffers) => {
				if let RebuildOutcome::Reloaded { generation } = session.sync(&buffers)? {
					eprintln!("-- reloaded ({generation})");
				}
			}
			Err(error) => {
				let error = format!("{error:#}");
				tracing::warn!(%error, "skipping reload");
			}
		}
		for entry in session.relay().since(last_seq) {
			last_seq = entry.seq;
			println!("{}", render(&entry, false)?);
		}
	}

	session.shutdown().await;
	Ok(ExitCode::SUCCESS)
}

pub fn fmt(file: &Path, write: bool) -> Result<ExitCode> {
	let buffer = load_buffer(file)?;
	let formatted = format_source(&buffer.content, buffer.language);
	if write {
		std::fs::write(file, formatted).with_context(|| format!("writing {}", file.display()))?;
	} else {
		print!("{formatted}");
	}
	Ok(ExitCode::SUCCESS)
}

pub fn lint(file: &Path) -> Result<ExitCode> {
	let buffer = load_buffer(file)?;
	let warnings = lint_source(&buffer.content, buffer.language);
	for warning in &warnings {
		println!("{}: {}", file.display(), warning.message());
	}
	Ok(if warnings.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[cfg(test)]
mod tests {
	use livepane_bridge::{ConsoleLevel, Generation};
	use pretty_assertions::assert_eq;

	use super::*;

	fn entry(signal: RelayedSignal) -> LogEntry {
		LogEntry {
			seq: 7,
			generation: Generation::from_raw(2),
			signal,
		}
	}

	#[test]
	fn renders_plain_lines() {
		let console = entry(RelayedSignal::Console {
			level: ConsoleLevel::Warn,
			text: "careful".into(),
		});
		assert_eq!(render(&console, false).expect("render"), "[warn] careful");

		let error = entry(RelayedSignal::Error {
			text: "Uncaught Error: boom".into(),
			line: 12,
			column: 1,
		});
		assert_eq!(render(&error, false).expect("render"), "[error 12:1] Uncaught Error: boom");
	}

	#[test]
	fn renders_json_lines() {
		let console = entry(RelayedSignal::Console {
			level: ConsoleLevel::Log,
			text: "x".into(),
		});
		let value: serde_json::Value = serde_json::from_str(&render(&console, true).expect("render")).expect("valid json");
		assert_eq!(value["seq"], 7);
		assert_eq!(value["signal"]["kind"], "console");
		assert_eq!(value["signal"]["level"], "log");
		assert_eq!(value["signal"]["text"], "x");
	}
}
