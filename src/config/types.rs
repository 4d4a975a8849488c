use crate::rules::RulePattern;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Typed value of an attribute.
///
/// Values start out as [`Value::Str`] (or [`Value::Args`] for actions) and are
/// rewritten to their typed variant during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Str(String),
	Bool(bool),
	Int(i64),
	Float(f64),
	Args(Vec<String>),
}

impl Value {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_args(&self) -> Option<&[String]> {
		match self {
			Value::Args(args) => Some(args),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Str(s) => f.write_str(s),
			Value::Bool(true) => f.write_str("True"),
			Value::Bool(false) => f.write_str("False"),
			Value::Int(i) => write!(f, "{i}"),
			Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
			Value::Float(x) => write!(f, "{x}"),
			Value::Args(args) => f.write_str(&args.join(" ")),
		}
	}
}

/// A log destination attached to a `config` attribute.
///
/// Clones share one handle. Closing it through any clone closes it for all
/// of them, so readers still holding a superseded config see it closed.
#[derive(Debug, Clone)]
pub struct LogFile {
	/// Resolved absolute (or base-relative) path of the destination.
	pub path: PathBuf,

	handle: Arc<Mutex<Option<File>>>,
}

impl LogFile {
	/// Open `path` for append, creating it if needed.
	pub fn open(path: PathBuf) -> std::io::Result<Self> {
		let file = OpenOptions::new().create(true).append(true).open(&path)?;
		Ok(LogFile {
			path,
			handle: Arc::new(Mutex::new(Some(file))),
		})
	}

	fn lock(&self) -> MutexGuard<'_, Option<File>> {
		self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	pub fn is_open(&self) -> bool {
		self.lock().is_some()
	}

	/// Close the handle. Later writes and clones fail with `NotConnected`.
	pub fn close(&self) {
		if self.lock().take().is_some() {
			tracing::debug!(path = %self.path.display(), "closed log file");
		}
	}

	/// A new descriptor for the same destination, e.g. for a child's stdio.
	pub fn try_clone_file(&self) -> std::io::Result<File> {
		match self.lock().as_ref() {
			Some(file) => file.try_clone(),
			None => Err(closed_error(&self.path)),
		}
	}

	/// Append `buf` to the destination.
	pub fn write_all(&self, buf: &[u8]) -> std::io::Result<()> {
		match self.lock().as_mut() {
			Some(file) => file.write_all(buf),
			None => Err(closed_error(&self.path)),
		}
	}

	/// Whether both values refer to the same underlying handle.
	pub fn same_handle(&self, other: &LogFile) -> bool {
		Arc::ptr_eq(&self.handle, &other.handle)
	}
}

fn closed_error(path: &Path) -> std::io::Error {
	std::io::Error::new(
		std::io::ErrorKind::NotConnected,
		format!("log file {} is closed", path.display()),
	)
}

/// One value bound to one key, tagged with the line it was declared on.
#[derive(Debug, Clone)]
pub struct Attribute {
	/// Source line, or `0` for injected defaults.
	pub line: usize,

	pub value: Value,

	log_file: Option<LogFile>,
}

impl Attribute {
	pub fn new(line: usize, value: Value) -> Self {
		Attribute {
			line,
			value,
			log_file: None,
		}
	}

	/// The log file opened for this attribute during evaluation, if any.
	pub fn log_file(&self) -> Option<&LogFile> {
		self.log_file.as_ref()
	}

	pub(crate) fn attach_log_file(&mut self, log_file: LogFile) {
		self.log_file = Some(log_file);
	}
}

/// The attribute(s) stored under one key of a section.
#[derive(Debug, Clone)]
pub enum Entry {
	/// A unique key (`config`, `env`, `watch`).
	Single(Attribute),

	/// Every invocation of one action, in declaration order.
	///
	/// Shared between the `default` section and the rule sections that
	/// inherit from it.
	Actions(Arc<Vec<Attribute>>),
}

impl Entry {
	/// Line of the first declaration under this key.
	pub fn line(&self) -> usize {
		self.attributes().first().map(|a| a.line).unwrap_or(0)
	}

	/// All attributes under this key.
	pub fn attributes(&self) -> &[Attribute] {
		match self {
			Entry::Single(attr) => std::slice::from_ref(attr),
			Entry::Actions(list) => list,
		}
	}

	pub fn as_single(&self) -> Option<&Attribute> {
		match self {
			Entry::Single(attr) => Some(attr),
			Entry::Actions(_) => None,
		}
	}

	pub fn as_single_mut(&mut self) -> Option<&mut Attribute> {
		match self {
			Entry::Single(attr) => Some(attr),
			Entry::Actions(_) => None,
		}
	}
}

/// What a section means, decided by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
	Config,
	Env,
	Default,
	Watch,
	Rule,
}

impl SectionKind {
	pub fn from_name(name: &str) -> Self {
		match name {
			"config" => SectionKind::Config,
			"env" => SectionKind::Env,
			"default" => SectionKind::Default,
			"watch" => SectionKind::Watch,
			_ => SectionKind::Rule,
		}
	}

	pub fn is_reserved(&self) -> bool {
		!matches!(self, SectionKind::Rule)
	}

	/// Whether attribute lines are action invocations (`default` and rules).
	pub fn holds_actions(&self) -> bool {
		matches!(self, SectionKind::Default | SectionKind::Rule)
	}
}

/// A named group of attributes.
#[derive(Debug, Clone)]
pub struct Section {
	/// Line of the section header, or `0` if the section was injected.
	pub line: usize,

	name: String,
	kind: SectionKind,
	attributes: IndexMap<String, Entry>,
	pattern: Option<RulePattern>,
}

impl Section {
	pub fn new(line: usize, name: impl Into<String>) -> Self {
		let name = name.into();
		Section {
			line,
			kind: SectionKind::from_name(&name),
			name,
			attributes: IndexMap::new(),
			pattern: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> SectionKind {
		self.kind
	}

	pub fn get(&self, key: &str) -> Option<&Entry> {
		self.attributes.get(key)
	}

	pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
		self.attributes.get_mut(key)
	}

	/// The single attribute stored under `key`.
	pub fn attribute(&self, key: &str) -> Option<&Attribute> {
		self.get(key).and_then(Entry::as_single)
	}

	pub fn attribute_mut(&mut self, key: &str) -> Option<&mut Attribute> {
		self.get_mut(key).and_then(Entry::as_single_mut)
	}

	/// Every invocation of action `key`.
	pub fn actions(&self, key: &str) -> Option<&[Attribute]> {
		match self.get(key)? {
			Entry::Actions(list) => Some(list),
			Entry::Single(_) => None,
		}
	}

	pub fn set(&mut self, key: impl Into<String>, entry: Entry) {
		self.attributes.insert(key.into(), entry);
	}

	pub fn contains(&self, key: &str) -> bool {
		self.attributes.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.attributes.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
		self.attributes.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}

	/// Compiled name of a rule section, set during evaluation.
	pub fn pattern(&self) -> Option<&RulePattern> {
		self.pattern.as_ref()
	}

	pub fn regex(&self) -> Option<&Regex> {
		self.pattern.as_ref().map(|p| &p.regex)
	}

	pub fn is_dir(&self) -> bool {
		self.pattern.as_ref().is_some_and(|p| p.is_dir)
	}

	pub fn is_file(&self) -> bool {
		self.pattern.as_ref().is_some_and(|p| p.is_file)
	}

	pub(crate) fn set_pattern(&mut self, pattern: RulePattern) {
		self.pattern = Some(pattern);
	}
}

/// Typed view of the evaluated `config` section.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
	pub path: PathBuf,
	pub foreground: bool,
	pub debug: i64,
	pub stdout: Option<LogFile>,
	pub stderr: Option<LogFile>,
	pub subprocess_limit: i64,
	pub subprocess_poll_interval: f64,
	pub subprocess_stdout: Option<LogFile>,
	pub subprocess_stderr: Option<LogFile>,
	pub move_event_timeout: f64,
}

/// A parsed configuration: sections in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Config {
	sections: IndexMap<String, Section>,
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&Section> {
		self.sections.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
		self.sections.get_mut(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.sections.contains_key(name)
	}

	/// Insert a section, keeping the first declaration's position.
	pub fn insert(&mut self, section: Section) {
		self.sections.insert(section.name.clone(), section);
	}

	/// All sections in declaration order.
	pub fn sections(&self) -> impl Iterator<Item = &Section> {
		self.sections.values()
	}

	pub(crate) fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
		self.sections.values_mut()
	}

	/// Rule sections in the order they are tried against paths.
	pub fn rules(&self) -> impl Iterator<Item = &Section> {
		self.sections().filter(|s| s.kind() == SectionKind::Rule)
	}

	pub fn len(&self) -> usize {
		self.sections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	/// Variables to export to spawned subprocesses, in declaration order.
	pub fn env(&self) -> Vec<(String, String)> {
		self.get("env")
			.map(|section| {
				section
					.iter()
					.filter_map(|(key, entry)| {
						let value = entry.as_single()?.value.to_string();
						Some((key.to_string(), value))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	/// Tokens listed in the `watch` section.
	pub fn watch_entries(&self) -> Vec<&str> {
		self.get("watch")
			.map(|section| section.keys().collect())
			.unwrap_or_default()
	}

	/// Typed `config` options.
	///
	/// Returns `None` until the configuration has been evaluated.
	pub fn options(&self) -> Option<RuntimeOptions> {
		let section = self.get("config")?;
		let value = |key: &str| section.attribute(key).map(|a| &a.value);
		let log_file = |key: &str| section.attribute(key).and_then(|a| a.log_file().cloned());

		Some(RuntimeOptions {
			path: Path::new(value("path")?.as_str()?).to_path_buf(),
			foreground: value("foreground")?.as_bool()?,
			debug: value("debug")?.as_int()?,
			stdout: log_file("stdout"),
			stderr: log_file("stderr"),
			subprocess_limit: value("subprocess_limit")?.as_int()?,
			subprocess_poll_interval: value("subprocess_poll_interval")?.as_float()?,
			subprocess_stdout: log_file("subprocess_stdout"),
			subprocess_stderr: log_file("subprocess_stderr"),
			move_event_timeout: value("move_event_timeout")?.as_float()?,
		})
	}
}
