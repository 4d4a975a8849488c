//! Loading and atomic reloading of a watchrc configuration file.

use crate::config::defaults::{Overrides, apply_defaults, apply_overrides};
use crate::config::dump::dump_config;
use crate::config::eval::{FILE_OPTIONS, TERMINAL_STREAMS, evaluate};
use crate::config::parser::parse_config_file;
use crate::config::types::{Config, Section};
use crate::error::{ConfigError, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Receives every successfully committed configuration.
pub trait ReloadCallback {
	/// Called after `current` is committed and before `previous` is released.
	/// `previous` is `None` on the first load.
	fn reload(&mut self, previous: Option<&Arc<Config>>, current: &Arc<Config>);
}

/// A configuration file and the last configuration read from it.
///
/// Reads never leave a partially evaluated configuration behind: the
/// committed [`Config`] is only replaced once a new one fully validates.
#[derive(Debug)]
pub struct NotifyConfig {
	config_path: PathBuf,
	base_path: PathBuf,
	committed: Option<Arc<Config>>,
}

impl NotifyConfig {
	/// `base_path` is the default for the `config.path` option, which relative
	/// log file paths are resolved against.
	pub fn new(config_path: impl Into<PathBuf>, base_path: impl Into<PathBuf>) -> Self {
		NotifyConfig {
			config_path: config_path.into(),
			base_path: base_path.into(),
			committed: None,
		}
	}

	pub fn config_path(&self) -> &Path {
		&self.config_path
	}

	/// Read the file and commit it.
	pub fn read(&mut self, overrides: &Overrides) -> Result<()> {
		self.read_inner(overrides, None)
	}

	/// Read the file, commit it and notify `callback`.
	pub fn read_with(
		&mut self,
		overrides: &Overrides,
		callback: &mut dyn ReloadCallback,
	) -> Result<()> {
		self.read_inner(overrides, Some(callback))
	}

	fn read_inner(
		&mut self,
		overrides: &Overrides,
		callback: Option<&mut dyn ReloadCallback>,
	) -> Result<()> {
		let previous = self.committed.clone();

		let config = match self.build(overrides, previous.as_deref()) {
			Ok(config) => Arc::new(config),
			Err(source) => {
				let err = self.locate(source);
				if previous.is_some() {
					tracing::warn!(error = %err, "reload rejected, keeping current configuration");
				}
				return Err(err);
			}
		};

		self.committed = Some(Arc::clone(&config));
		tracing::info!(
			path = %self.config_path.display(),
			sections = config.len(),
			rules = config.rules().count(),
			"configuration loaded"
		);

		if let Some(callback) = callback {
			callback.reload(previous.as_ref(), &config);
		}

		if let Some(previous) = previous {
			release(&previous);
		}

		Ok(())
	}

	fn build(
		&self,
		overrides: &Overrides,
		previous: Option<&Config>,
	) -> std::result::Result<Config, ConfigError> {
		let mut config = parse_config_file(&self.config_path)?;
		apply_defaults(&mut config, &self.base_path);
		apply_overrides(&mut config, overrides)?;
		evaluate(&mut config, previous)?;
		Ok(config)
	}

	fn locate(&self, source: ConfigError) -> Error {
		let file = self
			.config_path
			.file_name()
			.map(|name| name.to_string_lossy().to_string())
			.unwrap_or_else(|| self.config_path.to_string_lossy().to_string());
		Error::new(file, source)
	}

	/// The committed configuration, if a read has succeeded.
	pub fn current(&self) -> Option<Arc<Config>> {
		self.committed.clone()
	}

	/// Committed section by name.
	pub fn get(&self, name: &str) -> Option<&Section> {
		self.committed.as_deref()?.get(name)
	}

	/// Committed sections in declaration order.
	pub fn sections(&self) -> impl Iterator<Item = &Section> {
		self.committed.iter().flat_map(|config| config.sections())
	}

	/// Render the committed configuration, annotated with source lines.
	pub fn dump(&self) -> Option<String> {
		self.committed.as_deref().map(dump_config)
	}
}

/// Close the log files owned by a superseded configuration.
///
/// Readers still holding `previous` see the handles closed. In foreground
/// mode `stdout`/`stderr` are the terminal streams shared with the new
/// config and stay open.
fn release(previous: &Config) {
	let Some(section) = previous.get("config") else {
		return;
	};
	let foreground = section
		.attribute("foreground")
		.and_then(|a| a.value.as_bool())
		.unwrap_or(false);

	for key in FILE_OPTIONS {
		if foreground && TERMINAL_STREAMS.contains(key) {
			continue;
		}
		if let Some(log_file) = section.attribute(key).and_then(|a| a.log_file()) {
			log_file.close();
		}
	}
	tracing::debug!("released previous configuration");
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::Value;
	use std::fs;

	#[derive(Default)]
	struct Recorder {
		calls: Vec<(Option<Arc<Config>>, Arc<Config>)>,
	}

	impl ReloadCallback for Recorder {
		fn reload(&mut self, previous: Option<&Arc<Config>>, current: &Arc<Config>) {
			self.calls.push((previous.cloned(), Arc::clone(current)));
		}
	}

	fn setup(content: &str) -> (tempfile::TempDir, NotifyConfig) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("watchrc.conf");
		fs::write(&path, content).unwrap();
		let notify = NotifyConfig::new(&path, dir.path());
		(dir, notify)
	}

	#[test]
	fn test_first_read_commits() {
		let (_dir, mut notify) = setup("watch:\n    /tmp\n/foo/:\n    add x\n");
		assert!(notify.current().is_none());
		assert!(notify.dump().is_none());

		notify.read(&Overrides::new()).unwrap();

		assert_eq!(
			notify.sections().map(|s| s.name()).collect::<Vec<_>>(),
			vec!["watch", "/foo/", "config", "default", "env"]
		);
		assert!(notify.get("/foo/").unwrap().regex().is_some());
		assert!(notify.dump().unwrap().contains("/foo/:"));
	}

	#[test]
	fn test_error_is_located() {
		let (_dir, mut notify) = setup("config:\n    subprocess_limit abc\n");
		let err = notify.read(&Overrides::new()).unwrap_err();
		assert_eq!(
			err.to_string(),
			"watchrc.conf:2: invalid value 'abc' for subprocess_limit should be an integer"
		);
		assert!(notify.current().is_none());
	}

	#[test]
	fn test_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let mut notify = NotifyConfig::new(dir.path().join("absent.conf"), dir.path());
		let err = notify.read(&Overrides::new()).unwrap_err();
		assert!(matches!(err.kind(), ConfigError::Read { .. }));
		assert!(err.to_string().starts_with("absent.conf:0: failed to read"));
	}

	#[test]
	fn test_failed_reload_keeps_committed() {
		let (dir, mut notify) = setup("config:\n    stdout out.log\n/a/:\n    add x\n");
		notify.read(&Overrides::new()).unwrap();
		let before = notify.current().unwrap();

		fs::write(
			dir.path().join("watchrc.conf"),
			"config:\n    stdout other.log\nbadname:\n    add x\n",
		)
		.unwrap();
		let err = notify.read(&Overrides::new()).unwrap_err();
		assert!(matches!(err.kind(), ConfigError::InvalidSectionName { line: 3, .. }));

		let after = notify.current().unwrap();
		assert!(Arc::ptr_eq(&before, &after));
		assert!(notify.get("/a/").is_some());
		assert!(notify.get("badname").is_none());
		assert!(after.options().unwrap().stdout.unwrap().is_open());
	}

	#[test]
	fn test_successful_reload_closes_previous_log_files() {
		let (dir, mut notify) =
			setup("config:\n    stdout a.log\n    subprocess_stdout sub-a.log\n");
		notify.read(&Overrides::new()).unwrap();
		let old = notify.current().unwrap().options().unwrap();

		fs::write(
			dir.path().join("watchrc.conf"),
			"config:\n    stdout b.log\n    subprocess_stdout sub-b.log\n",
		)
		.unwrap();
		notify.read(&Overrides::new()).unwrap();

		assert!(!old.stdout.unwrap().is_open());
		assert!(!old.stderr.unwrap().is_open());
		assert!(!old.subprocess_stdout.unwrap().is_open());
		assert!(!old.subprocess_stderr.unwrap().is_open());

		let new = notify.current().unwrap().options().unwrap();
		assert!(new.stdout.unwrap().is_open());
		assert!(new.subprocess_stdout.unwrap().is_open());
	}

	#[test]
	fn test_foreground_reload_keeps_terminal_streams_open() {
		let (dir, mut notify) =
			setup("config:\n    foreground true\n    stdout a.log\n    subprocess_stdout sub-a.log\n");
		notify.read(&Overrides::new()).unwrap();
		let old = notify.current().unwrap().options().unwrap();

		fs::write(
			dir.path().join("watchrc.conf"),
			"config:\n    stdout b.log\n    subprocess_stdout sub-b.log\n",
		)
		.unwrap();
		notify.read(&Overrides::new()).unwrap();
		let new = notify.current().unwrap().options().unwrap();

		let (old_stdout, new_stdout) = (old.stdout.unwrap(), new.stdout.unwrap());
		assert!(old_stdout.is_open());
		assert!(old_stdout.same_handle(&new_stdout));
		assert!(old.stderr.unwrap().is_open());

		assert!(!old.subprocess_stdout.unwrap().is_open());
		assert!(new.subprocess_stdout.unwrap().is_open());
	}

	#[test]
	fn test_callback_sees_previous_and_current() {
		let (dir, mut notify) = setup("/a/:\n    add x\n");
		let mut recorder = Recorder::default();

		notify.read_with(&Overrides::new(), &mut recorder).unwrap();
		fs::write(dir.path().join("watchrc.conf"), "/b/:\n    add y\n").unwrap();
		notify.read_with(&Overrides::new(), &mut recorder).unwrap();

		assert_eq!(recorder.calls.len(), 2);
		assert!(recorder.calls[0].0.is_none());

		let (previous, current) = &recorder.calls[1];
		let previous = previous.as_ref().unwrap();
		assert!(Arc::ptr_eq(previous, &recorder.calls[0].1));
		assert!(previous.get("/a/").is_some());
		assert!(current.get("/b/").is_some());
		assert!(Arc::ptr_eq(current, &notify.current().unwrap()));
	}

	#[test]
	fn test_callback_not_called_on_failure() {
		let (_dir, mut notify) = setup("/a/:\n    explode x\n");
		let mut recorder = Recorder::default();
		assert!(notify.read_with(&Overrides::new(), &mut recorder).is_err());
		assert!(recorder.calls.is_empty());
	}

	#[test]
	fn test_overrides_are_coerced() {
		let (_dir, mut notify) = setup("config:\n    debug 1\n");
		let mut overrides = Overrides::new();
		overrides.insert("debug".to_string(), "4".to_string());
		notify.read(&overrides).unwrap();

		let debug = notify.get("config").unwrap().attribute("debug").unwrap();
		assert_eq!(debug.value, Value::Int(4));

		overrides.insert("debug".to_string(), "lots".to_string());
		let err = notify.read(&overrides).unwrap_err();
		assert!(matches!(err.kind(), ConfigError::InvalidInteger { line: 2, .. }));
	}

	#[test]
	fn test_foreground_cannot_change_on_reload() {
		let (dir, mut notify) = setup("config:\n    foreground true\n");
		notify.read(&Overrides::new()).unwrap();

		fs::write(dir.path().join("watchrc.conf"), "config:\n    foreground false\n").unwrap();
		notify.read(&Overrides::new()).unwrap();
		assert!(notify.current().unwrap().options().unwrap().foreground);

		fs::write(dir.path().join("watchrc.conf"), "config:\n    foreground nonsense\n").unwrap();
		notify.read(&Overrides::new()).unwrap();
		assert!(notify.current().unwrap().options().unwrap().foreground);
	}

	#[test]
	fn test_dump_of_committed_reloads() {
		let (dir, mut notify) = setup(
			"config:\n    debug 1\ndefault:\n    add /bin/echo added\n/\\.txt$/f:\n    delete /bin/echo deleted\n",
		);
		notify.read(&Overrides::new()).unwrap();
		let dump = notify.dump().unwrap();

		fs::write(dir.path().join("watchrc.conf"), dump).unwrap();
		notify.read(&Overrides::new()).unwrap();
		let rule = notify.get(r"/\.txt$/f").unwrap();
		assert!(rule.is_file());
		assert_eq!(rule.actions("add").unwrap().len(), 1);
	}
}
