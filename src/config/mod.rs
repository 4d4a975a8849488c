//! Parsing and evaluation of watchrc configuration files.
//!
//! This module handles:
//! - Joining continued lines and dropping comments
//! - Section/attribute grammar parsing
//! - Built-in defaults and runtime overrides
//! - Semantic validation and type coercion
//! - Rendering a config back to text

pub mod defaults;
pub mod dump;
pub mod eval;
pub mod lines;
pub mod parser;
pub mod types;

pub use defaults::{Overrides, apply_defaults, apply_overrides};
pub use dump::dump_config;
pub use eval::evaluate;
pub use lines::LogicalLines;
pub use parser::{ParseContext, parse_config_file, parse_config_str};
pub use types::{
	Attribute, Config, Entry, LogFile, RuntimeOptions, Section, SectionKind, Value,
};
