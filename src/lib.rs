//! watchrc - configuration language for a filesystem notification daemon.
//!
//! This library provides:
//! - Parsing of the section/attribute configuration format
//! - Validation, defaults and typed options
//! - Compilation of `/regexp/flags` rule sections
//! - Atomic reloading that keeps the last good configuration on error
//!
//! # Example
//!
//! ```no_run
//! use watchrc::{NotifyConfig, Overrides};
//!
//! let mut notify = NotifyConfig::new("/etc/watchrc.conf", "/var/lib/watchrc");
//! notify.read(&Overrides::new()).unwrap();
//!
//! for rule in notify.current().unwrap().rules() {
//!     println!("{} (dirs only: {})", rule.name(), rule.is_dir());
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod reload;
pub mod rules;

pub use config::{Config, Overrides, Section};
pub use error::{ConfigError, Error, Result};
pub use reload::{NotifyConfig, ReloadCallback};
