use std::fmt;
use std::str::FromStr;

/// Filesystem event an action line in a rule section reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	Add,
	Delete,
	Move,
	Open,
	CloseNowrite,
	CloseWrite,
	Event,
	Stop,
}

/// All actions in the order they are listed in diagnostics.
pub const ACTIONS: [Action; 8] = [
	Action::Add,
	Action::Delete,
	Action::Move,
	Action::Open,
	Action::CloseNowrite,
	Action::CloseWrite,
	Action::Event,
	Action::Stop,
];

impl Action {
	/// Keyword used for this action in the configuration file.
	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Add => "add",
			Action::Delete => "delete",
			Action::Move => "move",
			Action::Open => "open",
			Action::CloseNowrite => "close_nowrite",
			Action::CloseWrite => "close_write",
			Action::Event => "event",
			Action::Stop => "stop",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ACTIONS.iter().copied().find(|a| a.as_str() == s).ok_or(())
	}
}
