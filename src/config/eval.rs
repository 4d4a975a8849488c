use crate::config::defaults::is_config_option;
use crate::config::types::{Config, Entry, LogFile, Section, SectionKind, Value};
use crate::error::ConfigError;
use crate::rules::{Action, RulePattern};
use std::path::{Component, Path, PathBuf};

const BOOL_OPTIONS: &[&str] = &["foreground"];
const INT_OPTIONS: &[&str] = &["debug", "subprocess_limit"];
const FLOAT_OPTIONS: &[&str] = &["move_event_timeout", "subprocess_poll_interval"];
pub(crate) const FILE_OPTIONS: &[&str] = &["stdout", "stderr", "subprocess_stdout", "subprocess_stderr"];

/// Options that stay bound to the terminal when running in the foreground.
pub(crate) const TERMINAL_STREAMS: &[&str] = &["stdout", "stderr"];

/// Validate and type a parsed config that already has defaults applied.
///
/// `previous` is the committed config this one will replace, if any. Values
/// that cannot change at runtime are taken from it.
pub fn evaluate(config: &mut Config, previous: Option<&Config>) -> Result<(), ConfigError> {
	check_unknown_options(config)?;
	inherit_defaults(config);
	compile_rule_sections(config)?;
	check_actions(config)?;

	let section = config
		.get_mut("config")
		.ok_or_else(|| ConfigError::Syntax {
			line: 0,
			message: "missing config section".to_string(),
		})?;
	coerce_bools(section, previous)?;
	coerce_ints(section)?;
	coerce_floats(section)?;
	open_log_files(section, previous)?;

	tracing::debug!(rules = config.rules().count(), "evaluated configuration");
	Ok(())
}

fn check_unknown_options(config: &Config) -> Result<(), ConfigError> {
	let Some(section) = config.get("config") else {
		return Ok(());
	};

	for (key, entry) in section.iter() {
		if !is_config_option(key) {
			return Err(ConfigError::UnknownOption {
				line: entry.line(),
				key: key.to_string(),
				section: section.name().to_string(),
			});
		}
	}
	Ok(())
}

/// Share every `default` action with rule sections that do not set it.
fn inherit_defaults(config: &mut Config) {
	let inherited: Vec<(String, Entry)> = match config.get("default") {
		Some(section) => section
			.iter()
			.map(|(key, entry)| (key.to_string(), entry.clone()))
			.collect(),
		None => return,
	};

	for section in config.sections_mut() {
		if section.kind() != SectionKind::Rule {
			continue;
		}
		for (key, entry) in &inherited {
			if !section.contains(key) {
				section.set(key.clone(), entry.clone());
			}
		}
	}
}

fn compile_rule_sections(config: &mut Config) -> Result<(), ConfigError> {
	for section in config.sections_mut() {
		if section.kind() != SectionKind::Rule {
			continue;
		}
		let pattern = RulePattern::parse(section.name(), section.line)?;
		section.set_pattern(pattern);
	}
	Ok(())
}

fn check_actions(config: &Config) -> Result<(), ConfigError> {
	for section in config.sections() {
		if !section.kind().holds_actions() {
			continue;
		}
		for (key, entry) in section.iter() {
			if key.parse::<Action>().is_err() {
				return Err(ConfigError::UnknownAction {
					line: entry.line(),
					action: key.to_string(),
				});
			}
		}
	}
	Ok(())
}

fn raw_value<'a>(section: &'a Section, key: &str) -> (usize, &'a str) {
	match section.attribute(key) {
		Some(attr) => (attr.line, attr.value.as_str().unwrap_or_default()),
		None => (0, ""),
	}
}

fn coerce_bools(section: &mut Section, previous: Option<&Config>) -> Result<(), ConfigError> {
	for key in BOOL_OPTIONS {
		// Not changeable at runtime.
		if let Some(previous) = previous {
			let old = previous
				.get("config")
				.and_then(|s| s.attribute(key))
				.map(|a| a.value.clone());
			if let (Some(old), Some(attr)) = (old, section.attribute_mut(key)) {
				attr.value = old;
				continue;
			}
		}

		let (line, raw) = raw_value(section, key);
		let value = match raw.to_lowercase().as_str() {
			"true" => true,
			"false" => false,
			_ => {
				return Err(ConfigError::InvalidBoolean {
					line,
					key: key.to_string(),
					value: raw.to_string(),
				});
			}
		};
		if let Some(attr) = section.attribute_mut(key) {
			attr.value = Value::Bool(value);
		}
	}
	Ok(())
}

fn coerce_ints(section: &mut Section) -> Result<(), ConfigError> {
	for key in INT_OPTIONS {
		let (line, raw) = raw_value(section, key);
		let value = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidInteger {
			line,
			key: key.to_string(),
			value: raw.to_string(),
		})?;
		if let Some(attr) = section.attribute_mut(key) {
			attr.value = Value::Int(value);
		}
	}
	Ok(())
}

fn coerce_floats(section: &mut Section) -> Result<(), ConfigError> {
	for key in FLOAT_OPTIONS {
		let (line, raw) = raw_value(section, key);
		let value = raw.trim().parse::<f64>().map_err(|_| ConfigError::InvalidFloat {
			line,
			key: key.to_string(),
			value: raw.to_string(),
		})?;
		if let Some(attr) = section.attribute_mut(key) {
			attr.value = Value::Float(value);
		}
	}
	Ok(())
}

fn open_log_files(section: &mut Section, previous: Option<&Config>) -> Result<(), ConfigError> {
	let foreground = section
		.attribute("foreground")
		.and_then(|a| a.value.as_bool())
		.unwrap_or(false);
	let base = raw_value(section, "path").1.to_string();

	for key in FILE_OPTIONS {
		if let Some(previous) = previous
			&& foreground
			&& TERMINAL_STREAMS.contains(key)
		{
			let kept = previous
				.get("config")
				.and_then(|s| s.attribute(key))
				.and_then(|a| a.log_file().cloned());
			if let (Some(kept), Some(attr)) = (kept, section.attribute_mut(key)) {
				tracing::debug!(option = %key, path = %kept.path.display(), "keeping terminal stream");
				attr.attach_log_file(kept);
			}
			continue;
		}

		let (line, raw) = raw_value(section, key);
		let path = resolve_path(raw, Path::new(&base));
		let log_file = LogFile::open(path.clone()).map_err(|source| ConfigError::FileOpen {
			line,
			key: key.to_string(),
			path: path.clone(),
			source,
		})?;

		tracing::debug!(option = %key, path = %path.display(), "opened log file");
		if let Some(attr) = section.attribute_mut(key) {
			attr.attach_log_file(log_file);
		}
	}
	Ok(())
}

/// Resolve `path` against `base` and normalize it lexically.
///
/// Absolute paths are only normalized.
pub fn resolve_path(path: &str, base: &Path) -> PathBuf {
	let path = Path::new(path);
	let joined = if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	};
	normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
					&& out.pop();
				if !popped && !out.has_root() {
					out.push("..");
				}
			}
			other => out.push(other.as_os_str()),
		}
	}
	if out.as_os_str().is_empty() {
		out.push(".");
	}
	out
}
