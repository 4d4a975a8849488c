use crate::config::types::{Attribute, Config, Entry, Section, Value};
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::path::Path;

/// Runtime replacements for `config` section values, keyed by option name.
pub type Overrides = IndexMap<String, String>;

/// Built-in `config` options and their defaults. `path` is filled in from
/// the caller's base directory.
pub const CONFIG_DEFAULTS: &[(&str, &str)] = &[
	("foreground", "False"),
	("debug", "0"),
	("stdout", "/dev/null"),
	("stderr", "/dev/null"),
	("subprocess_limit", "10"),
	("subprocess_poll_interval", "1"),
	("subprocess_stdout", "/dev/null"),
	("subprocess_stderr", "/dev/null"),
	("move_event_timeout", "0.5"),
];

/// Reserved sections that always exist after defaults are applied.
pub const DEFAULTED_SECTIONS: &[&str] = &["config", "default", "env"];

/// Whether `key` is a recognized `config` option.
pub fn is_config_option(key: &str) -> bool {
	key == "path" || CONFIG_DEFAULTS.iter().any(|(k, _)| *k == key)
}

/// Default table for one reserved section.
pub fn section_defaults(section: &str, base_path: &Path) -> Vec<(&'static str, String)> {
	match section {
		"config" => {
			let mut defaults = vec![("path", base_path.to_string_lossy().to_string())];
			defaults.extend(CONFIG_DEFAULTS.iter().map(|(k, v)| (*k, v.to_string())));
			defaults
		}
		_ => Vec::new(),
	}
}

/// Create missing reserved sections and fill in unset options.
///
/// Injected sections and attributes are tagged with line `0`.
pub fn apply_defaults(config: &mut Config, base_path: &Path) {
	for name in DEFAULTED_SECTIONS {
		if !config.contains(name) {
			config.insert(Section::new(0, *name));
		}

		let Some(section) = config.get_mut(name) else {
			continue;
		};
		for (key, value) in section_defaults(name, base_path) {
			if !section.contains(key) {
				section.set(key, Entry::Single(Attribute::new(0, Value::Str(value))));
			}
		}
	}
}

/// Replace `config` values with runtime overrides.
///
/// Overridden values are still raw text and go through type coercion like
/// values read from the file.
pub fn apply_overrides(config: &mut Config, overrides: &Overrides) -> Result<(), ConfigError> {
	for (key, value) in overrides {
		let attr = config
			.get_mut("config")
			.and_then(|section| section.attribute_mut(key))
			.filter(|_| is_config_option(key))
			.ok_or_else(|| ConfigError::UnknownOption {
				line: 0,
				key: key.clone(),
				section: "config".to_string(),
			})?;

		tracing::debug!(option = %key, value = %value, "applying override");
		attr.value = Value::Str(value.clone());
	}

	Ok(())
}
