//! Log level option and tracing subscriber setup

use std::fmt;

use serde::{Deserialize, Deserializer};
use tracing::level_filters::LevelFilter;

/// Minimum severity of emitted log events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl LogLevel {
	/// Parse a level name. Unknown names fall back to `Info`.
	pub fn parse(name: &str) -> Self {
		match name.trim().to_ascii_uppercase().as_str() {
			"DEBUG" => LogLevel::Debug,
			"WARN" | "WARNING" => LogLevel::Warn,
			"ERROR" => LogLevel::Error,
			_ => LogLevel::Info,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			LogLevel::Debug => "DEBUG",
			LogLevel::Info => "INFO",
			LogLevel::Warn => "WARN",
			LogLevel::Error => "ERROR",
		}
	}

	pub fn as_filter(self) -> LevelFilter {
		match self {
			LogLevel::Debug => LevelFilter::DEBUG,
			LogLevel::Info => LevelFilter::INFO,
			LogLevel::Warn => LevelFilter::WARN,
			LogLevel::Error => LevelFilter::ERROR,
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for LogLevel {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let name = String::deserialize(deserializer)?;
		Ok(LogLevel::parse(&name))
	}
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Calling this more than
/// once is harmless; only the first subscriber is installed.
pub fn init_tracing(level: LogLevel) {
	let filter = tracing_subscriber::EnvFilter::builder()
		.with_default_directive(level.as_filter().into())
		.from_env_lossy();
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_level_ordering() {
		let levels = [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error];
		for pair in levels.windows(2) {
			assert!(pair[0] < pair[1], "{} should be below {}", pair[0], pair[1]);
		}
	}

	#[test]
	fn test_parse_is_case_insensitive() {
		assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
		assert_eq!(LogLevel::parse("Warning"), LogLevel::Warn);
		assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
	}

	#[test]
	fn test_unknown_level_defaults_to_info() {
		assert_eq!(LogLevel::parse("garbage"), LogLevel::Info);
		assert_eq!(LogLevel::parse(""), LogLevel::Info);
	}

	#[test]
	fn test_init_twice() {
		init_tracing(LogLevel::Error);
		init_tracing(LogLevel::Debug);
	}
}

// vim: ts=4
