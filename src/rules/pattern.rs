use crate::error::ConfigError;
use regex::{Regex, RegexBuilder};

/// Compiled form of a rule section name `/REGEXP/FLAGS`.
#[derive(Debug, Clone)]
pub struct RulePattern {
	/// The compiled path regex.
	pub regex: Regex,

	/// `i` flag: match case-insensitively.
	pub case_insensitive: bool,

	/// `d` flag: rule only applies to directories.
	pub is_dir: bool,

	/// `f` flag: rule only applies to files.
	pub is_file: bool,
}

impl RulePattern {
	/// Compile a rule section name declared at `line`.
	///
	/// The name is split on its last `/`; everything before it must start
	/// with `/` and is the regex body, everything after it is the flag set.
	pub fn parse(name: &str, line: usize) -> Result<Self, ConfigError> {
		let (head, flags) = name
			.rsplit_once('/')
			.filter(|(head, _)| head.starts_with('/'))
			.ok_or_else(|| ConfigError::InvalidSectionName {
				line,
				name: name.to_string(),
			})?;
		let body = &head[1..];

		let mut case_insensitive = false;
		let mut is_dir = false;
		let mut is_file = false;
		let mut unknown = String::new();
		for flag in flags.chars() {
			match flag {
				'i' => case_insensitive = true,
				'd' => is_dir = true,
				'f' => is_file = true,
				other => unknown.push(other),
			}
		}
		if !unknown.is_empty() {
			return Err(ConfigError::UnknownMatchOption {
				line,
				flags: unknown,
			});
		}

		let regex = RegexBuilder::new(body)
			.case_insensitive(case_insensitive)
			.build()
			.map_err(|source| ConfigError::Regex {
				line,
				section: name.to_string(),
				source,
			})?;

		Ok(RulePattern {
			regex,
			case_insensitive,
			is_dir,
			is_file,
		})
	}
}
