//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WATCHRC_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to stderr so `dump` output on stdout stays clean.

use clap::ValueEnum;
use tracing_subscriber::fmt;

/// Environment variable consulted when no level is given on the command line.
pub const LOG_ENV_VAR: &str = "WATCHRC_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl From<LogLevel> for tracing::Level {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Error => tracing::Level::ERROR,
			LogLevel::Warn => tracing::Level::WARN,
			LogLevel::Info => tracing::Level::INFO,
			LogLevel::Debug => tracing::Level::DEBUG,
			LogLevel::Trace => tracing::Level::TRACE,
		}
	}
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) {
	let level = resolve_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

	fmt()
		.with_max_level(level)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
	match cli_level {
		Some(level) => level.into(),
		None => env_value
			.and_then(parse_level_str)
			.unwrap_or(tracing::Level::INFO),
	}
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
	match s.trim().to_lowercase().as_str() {
		"error" => Some(tracing::Level::ERROR),
		"warn" | "warning" => Some(tracing::Level::WARN),
		"info" => Some(tracing::Level::INFO),
		"debug" => Some(tracing::Level::DEBUG),
		"trace" => Some(tracing::Level::TRACE),
		_ => None,
	}
}
