//! Rule section vocabulary for watchrc.
//!
//! This module handles:
//! - Compiling rule section names (`/regexp/flags`) into path regexes
//! - The fixed set of actions a rule section may declare

pub mod action;
pub mod pattern;

pub use action::{ACTIONS, Action};
pub use pattern::RulePattern;
