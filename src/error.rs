use std::path::PathBuf;

use crate::rules::action::ACTIONS;

/// A configuration failure, tagged with the source line it was found on.
///
/// Line `0` marks values that were never written in the file (built-in
/// defaults and runtime overrides).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{message}")]
	Syntax { line: usize, message: String },

	#[error("section '{name}' already defined at line {first_line}")]
	DuplicateSection {
		line: usize,
		name: String,
		first_line: usize,
	},

	#[error("attribute '{key}' already set at line {first_line}")]
	DuplicateAttribute {
		line: usize,
		key: String,
		first_line: usize,
	},

	#[error("unknown option '{key}' in {section} section")]
	UnknownOption {
		line: usize,
		key: String,
		section: String,
	},

	#[error("unknown action '{action}' should be {}", action_list())]
	UnknownAction { line: usize, action: String },

	#[error("invalid regexp section '{name}' should be '/regexp/[options]:'")]
	InvalidSectionName { line: usize, name: String },

	#[error("unknown match rule option '{flags}'")]
	UnknownMatchOption { line: usize, flags: String },

	#[error("{section}: {source}")]
	Regex {
		line: usize,
		section: String,
		#[source]
		source: regex::Error,
	},

	#[error("invalid bool value '{value}' for {key} should be true or false")]
	InvalidBoolean {
		line: usize,
		key: String,
		value: String,
	},

	#[error("invalid value '{value}' for {key} should be an integer")]
	InvalidInteger {
		line: usize,
		key: String,
		value: String,
	},

	#[error("invalid value '{value}' for {key} should be a number")]
	InvalidFloat {
		line: usize,
		key: String,
		value: String,
	},

	#[error("open failed for {key}: {}: {source}", .path.display())]
	FileOpen {
		line: usize,
		key: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl ConfigError {
	/// Source line the error refers to.
	pub fn line(&self) -> usize {
		match self {
			ConfigError::Read { .. } => 0,
			ConfigError::Syntax { line, .. }
			| ConfigError::DuplicateSection { line, .. }
			| ConfigError::DuplicateAttribute { line, .. }
			| ConfigError::UnknownOption { line, .. }
			| ConfigError::UnknownAction { line, .. }
			| ConfigError::InvalidSectionName { line, .. }
			| ConfigError::UnknownMatchOption { line, .. }
			| ConfigError::Regex { line, .. }
			| ConfigError::InvalidBoolean { line, .. }
			| ConfigError::InvalidInteger { line, .. }
			| ConfigError::InvalidFloat { line, .. }
			| ConfigError::FileOpen { line, .. } => *line,
		}
	}
}

fn action_list() -> String {
	match ACTIONS.split_last() {
		Some((last, rest)) => {
			let rest: Vec<&str> = rest.iter().map(|a| a.as_str()).collect();
			format!("{}, or {}", rest.join(", "), last.as_str())
		}
		None => String::new(),
	}
}

/// A [`ConfigError`] located in a named configuration file.
///
/// Displays as `<file>:<line>: <message>`.
#[derive(Debug, thiserror::Error)]
#[error("{file}:{}: {source}", .source.line())]
pub struct Error {
	/// Basename of the configuration file.
	pub file: String,

	#[source]
	pub source: ConfigError,
}

impl Error {
	pub fn new(file: impl Into<String>, source: ConfigError) -> Self {
		Error {
			file: file.into(),
			source,
		}
	}

	pub fn line(&self) -> usize {
		self.source.line()
	}

	pub fn kind(&self) -> &ConfigError {
		&self.source
	}
}

/// Result type alias using the located [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
