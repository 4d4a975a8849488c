use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use watchrc::logging::{LogLevel, init_logging};
use watchrc::{NotifyConfig, Overrides};

#[derive(Parser)]
#[command(name = "watchrc")]
#[command(
	author,
	version,
	about = "Check and inspect configuration files for a filesystem notification daemon"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Configuration file (defaults to <config dir>/watchrc/watchrc.conf)
	#[arg(short, long, value_name = "FILE", global = true)]
	config: Option<PathBuf>,

	/// Base directory for relative log paths (defaults to the config file's directory)
	#[arg(long, value_name = "DIR", global = true)]
	base_dir: Option<PathBuf>,

	/// Override a config option, e.g. --set debug=2
	#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override, global = true)]
	overrides: Vec<(String, String)>,

	/// Log level (overrides WATCHRC_LOG)
	#[arg(long, value_enum, global = true)]
	log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
enum Commands {
	/// Validate the configuration file
	Check,
	/// Print the evaluated configuration annotated with source lines
	Dump,
	/// Print typed options, environment and watch entries
	Show,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.log_level);

	let config_path = match cli.config {
		Some(path) => path,
		None => default_config_path()?,
	};
	let base_dir = cli
		.base_dir
		.unwrap_or_else(|| default_base_dir(&config_path));
	let overrides: Overrides = cli.overrides.into_iter().collect();

	let mut notify = NotifyConfig::new(&config_path, base_dir);
	if let Err(e) = notify.read(&overrides) {
		eprintln!("{e}");
		return Ok(ExitCode::FAILURE);
	}

	match cli.command {
		Commands::Check => handle_check(&notify),
		Commands::Dump => handle_dump(&notify),
		Commands::Show => handle_show(&notify),
	}
}

fn handle_check(notify: &NotifyConfig) -> Result<ExitCode> {
	let config = notify.current().context("No configuration loaded")?;
	println!(
		"{}: ok ({} sections, {} rules)",
		notify.config_path().display(),
		config.len(),
		config.rules().count()
	);
	Ok(ExitCode::SUCCESS)
}

fn handle_dump(notify: &NotifyConfig) -> Result<ExitCode> {
	let dump = notify.dump().context("No configuration loaded")?;
	print!("{dump}");
	Ok(ExitCode::SUCCESS)
}

fn handle_show(notify: &NotifyConfig) -> Result<ExitCode> {
	let config = notify.current().context("No configuration loaded")?;
	let options = config.options().context("Configuration was not evaluated")?;
	let log_path = |log: &Option<watchrc::config::LogFile>| {
		log.as_ref()
			.map(|l| l.path.display().to_string())
			.unwrap_or_else(|| "-".to_string())
	};

	println!("Options:");
	println!("  path: {}", options.path.display());
	println!("  foreground: {}", options.foreground);
	println!("  debug: {}", options.debug);
	println!("  stdout: {}", log_path(&options.stdout));
	println!("  stderr: {}", log_path(&options.stderr));
	println!("  subprocess_limit: {}", options.subprocess_limit);
	println!("  subprocess_poll_interval: {}", options.subprocess_poll_interval);
	println!("  subprocess_stdout: {}", log_path(&options.subprocess_stdout));
	println!("  subprocess_stderr: {}", log_path(&options.subprocess_stderr));
	println!("  move_event_timeout: {}", options.move_event_timeout);

	println!("Environment:");
	for (name, value) in config.env() {
		println!("  {name}={value}");
	}

	println!("Watch:");
	for entry in config.watch_entries() {
		println!("  {entry}");
	}

	println!("Rules:");
	for rule in config.rules() {
		let actions: Vec<&str> = rule.keys().collect();
		println!(
			"  {} (dir: {}, file: {}): {}",
			rule.name(),
			rule.is_dir(),
			rule.is_file(),
			actions.join(", ")
		);
	}

	Ok(ExitCode::SUCCESS)
}

fn parse_override(s: &str) -> std::result::Result<(String, String), String> {
	let (key, value) = s
		.split_once('=')
		.ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
	if key.is_empty() {
		return Err(format!("empty option name in '{s}'"));
	}
	Ok((key.to_string(), value.to_string()))
}

fn default_config_path() -> Result<PathBuf> {
	let dir = dirs::config_dir().context("Failed to resolve the user configuration directory")?;
	Ok(dir.join("watchrc").join("watchrc.conf"))
}

fn default_base_dir(config_path: &Path) -> PathBuf {
	match config_path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => PathBuf::from("."),
	}
}
