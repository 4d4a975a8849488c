use crate::config::lines::LogicalLines;
use crate::config::types::{Attribute, Config, Entry, Section, SectionKind, Value};
use crate::error::ConfigError;
use std::path::Path;
use std::sync::Arc;

/// Read and parse a config file from the given path.
///
/// The result is the raw model: no defaults, no validation.
pub fn parse_config_file(path: &Path) -> Result<Config, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content)
}

/// Parse config text (useful for testing).
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
	let mut ctx = ParseContext::default();

	for (line_number, line) in LogicalLines::new(content) {
		ctx.line = line_number;
		parse_line(&mut ctx, &line)?;
	}

	tracing::debug!(sections = ctx.config.len(), "parsed configuration");
	Ok(ctx.config)
}

/// State threaded through the parse of one file.
#[derive(Debug, Default)]
pub struct ParseContext {
	/// The config built so far.
	pub config: Config,

	/// Name of the section attribute lines are added to.
	pub current: Option<String>,

	/// Logical line being parsed.
	pub line: usize,
}

/// Parse one logical line into `ctx`.
pub fn parse_line(ctx: &mut ParseContext, line: &str) -> Result<(), ConfigError> {
	let indented = line.starts_with([' ', '\t']);
	let line = line.trim();

	if line.is_empty() {
		return Ok(());
	}

	if let Some(name) = line.strip_suffix(':') {
		return add_section(ctx, name);
	}

	let section = match &ctx.current {
		Some(name) if indented => name.clone(),
		_ => {
			return Err(ConfigError::Syntax {
				line: ctx.line,
				message: format!("non indented attribute or invalid section name '{line}'"),
			});
		}
	};

	match SectionKind::from_name(&section) {
		SectionKind::Watch => add_attribute(ctx, &section, line, Value::Str(String::new())),
		SectionKind::Env | SectionKind::Config => {
			let (key, value) = line.split_once(' ').unwrap_or((line, ""));
			add_attribute(ctx, &section, key, Value::Str(value.to_string()))
		}
		SectionKind::Default | SectionKind::Rule => {
			// `#` inside an action line is an ordinary argument, not a comment.
			let mut parts = shlex::split(line).ok_or_else(|| ConfigError::Syntax {
				line: ctx.line,
				message: format!("invalid syntax, unclosed quotation or trailing escape: {line}"),
			})?;
			if parts.is_empty() {
				return Err(ConfigError::Syntax {
					line: ctx.line,
					message: format!("invalid syntax, missing action: {line}"),
				});
			}
			let key = parts.remove(0);
			add_action(ctx, &section, key, parts);
			Ok(())
		}
	}
}

fn add_section(ctx: &mut ParseContext, name: &str) -> Result<(), ConfigError> {
	if let Some(existing) = ctx.config.get(name) {
		return Err(ConfigError::DuplicateSection {
			line: ctx.line,
			name: name.to_string(),
			first_line: existing.line,
		});
	}

	ctx.config.insert(Section::new(ctx.line, name));
	ctx.current = Some(name.to_string());
	Ok(())
}

fn add_attribute(
	ctx: &mut ParseContext,
	section: &str,
	key: &str,
	value: Value,
) -> Result<(), ConfigError> {
	let line = ctx.line;
	let Some(section) = ctx.config.get_mut(section) else {
		return Ok(());
	};

	if let Some(existing) = section.get(key) {
		return Err(ConfigError::DuplicateAttribute {
			line,
			key: key.to_string(),
			first_line: existing.line(),
		});
	}

	section.set(key, Entry::Single(Attribute::new(line, value)));
	Ok(())
}

fn add_action(ctx: &mut ParseContext, section: &str, key: String, args: Vec<String>) {
	let attr = Attribute::new(ctx.line, Value::Args(args));
	let Some(section) = ctx.config.get_mut(section) else {
		return;
	};

	match section.get_mut(&key) {
		Some(Entry::Actions(list)) => Arc::make_mut(list).push(attr),
		_ => section.set(key, Entry::Actions(Arc::new(vec![attr]))),
	}
}
