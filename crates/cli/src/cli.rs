use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "livepane")]
#[command(about = "Sandboxed live preview for html, css, and javascript buffers")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to the platform config directory)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Raise log verbosity (-v debug, -vv trace)
	#[arg(long, short = 'v', action = ArgAction::Count, global = true)]
	pub verbose: u8,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the preview once and print its logs
	Preview {
		/// Buffer files; the extension picks the language
		#[arg(required = true)]
		files: Vec<PathBuf>,
		/// How long to wait for the run to settle
		#[arg(long, default_value_t = 5000)]
		wait_ms: u64,
		/// Print log entries as JSON lines
		#[arg(long)]
		json: bool,
	},
	/// Print the assembled preview document
	Assemble {
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
	/// Execute one buffer and print its captured output
	Exec {
		file: PathBuf,
		/// Language tag overriding the file extension
		#[arg(long, short = 'l')]
		language: Option<String>,
	},
	/// Re-run the preview whenever one of the files changes
	Watch {
		#[arg(required = true)]
		files: Vec<PathBuf>,
		/// Polling interval
		#[arg(long, default_value_t = 500)]
		interval_ms: u64,
	},
	/// Trim every line of a buffer
	Fmt {
		file: PathBuf,
		/// Rewrite the file instead of printing
		#[arg(long)]
		write: bool,
	},
	/// Report heuristic warnings for a buffer
	Lint { file: PathBuf },
}
