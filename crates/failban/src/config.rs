//! Guard Configuration
//!
//! Raw, deserializable options and the validated settings the guard is
//! built from.

use std::time::Duration;

use axum::http::HeaderName;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Header carrying the real client address when running behind Cloudflare
pub const DEFAULT_CLIENT_HEADER: &str = "Cf-Connecting-IP";

/// Lower bound for the reaper period
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

const ENV_NUMBER_FAILS: &str = "FAILBAN_NUMBER_FAILS";
const ENV_BAN_TIME: &str = "FAILBAN_BAN_TIME";
const ENV_CLIENT_HEADER: &str = "FAILBAN_CLIENT_HEADER";
const ENV_LOG_LEVEL: &str = "FAILBAN_LOG_LEVEL";

/// Raw guard options as supplied by the host
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
	/// Bad responses before a client is banned
	pub number_fails: u32,
	/// Ban window, e.g. "3h", "90m", "1.5s"
	pub ban_time: String,
	/// Header whose value identifies the client instead of the peer address
	pub client_header: Option<String>,
	pub log_level: LogLevel,
}

impl Default for GuardConfig {
	fn default() -> Self {
		Self {
			number_fails: 3,
			ban_time: "3h".to_string(),
			client_header: Some(DEFAULT_CLIENT_HEADER.to_string()),
			log_level: LogLevel::Info,
		}
	}
}

impl GuardConfig {
	/// Load options from `FAILBAN_*` environment variables, falling back to
	/// the defaults for unset ones.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Load options through an arbitrary key lookup
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(value) = lookup(ENV_NUMBER_FAILS) {
			config.number_fails =
				value.trim().parse().map_err(|_| ConfigError::InvalidNumberFails(value.clone()))?;
		}
		if let Some(value) = lookup(ENV_BAN_TIME) {
			config.ban_time = value;
		}
		if let Some(value) = lookup(ENV_CLIENT_HEADER) {
			// Explicitly empty disables the header override
			config.client_header = if value.is_empty() { None } else { Some(value) };
		}
		if let Some(value) = lookup(ENV_LOG_LEVEL) {
			config.log_level = LogLevel::parse(&value);
		}

		Ok(config)
	}

	/// Validate the options into immutable settings
	pub fn build(&self) -> Result<GuardSettings, ConfigError> {
		let ban_time = parse_duration(&self.ban_time).map_err(|reason| {
			ConfigError::InvalidBanTime { value: self.ban_time.clone(), reason }
		})?;

		let client_header = match self.client_header.as_deref() {
			None | Some("") => None,
			Some(name) => Some(
				HeaderName::from_bytes(name.as_bytes())
					.map_err(|_| ConfigError::InvalidClientHeader(name.to_string()))?,
			),
		};

		Ok(GuardSettings {
			max_fails: self.number_fails,
			ban_time,
			client_header,
			log_level: self.log_level,
		})
	}
}

/// Validated guard settings
#[derive(Clone, Debug)]
pub struct GuardSettings {
	pub max_fails: u32,
	pub ban_time: Duration,
	pub client_header: Option<HeaderName>,
	pub log_level: LogLevel,
}

impl GuardSettings {
	/// Reaper period: a quarter of the ban time
	pub fn sweep_interval(&self) -> Duration {
		(self.ban_time / 4).max(MIN_SWEEP_INTERVAL)
	}
}

/// Parse a duration such as "300ms", "1.5h" or "2h45m".
///
/// Valid units are "ns", "us" (or "µs"), "ms", "s", "m", "h". Negative
/// values are rejected; the bare string "0" is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, &'static str> {
	let mut s = input;
	if let Some(rest) = s.strip_prefix('+') {
		s = rest;
	} else if s.starts_with('-') {
		return Err("negative duration");
	}
	if s == "0" {
		return Ok(Duration::ZERO);
	}
	if s.is_empty() {
		return Err("empty duration");
	}

	let mut total: u128 = 0;
	while !s.is_empty() {
		let int_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
		let (int_part, rest) = s.split_at(int_end);
		let (frac_part, rest) = match rest.strip_prefix('.') {
			Some(after_dot) => {
				let end = after_dot.find(|c: char| !c.is_ascii_digit()).unwrap_or(after_dot.len());
				after_dot.split_at(end)
			}
			None => ("", rest),
		};
		if int_part.is_empty() && frac_part.is_empty() {
			return Err("expected a number");
		}

		let unit_end = rest.find(|c: char| c == '.' || c.is_ascii_digit()).unwrap_or(rest.len());
		let (unit, rest) = rest.split_at(unit_end);
		let scale: u128 = match unit {
			"ns" => 1,
			"us" | "µs" | "μs" => 1_000,
			"ms" => 1_000_000,
			"s" => 1_000_000_000,
			"m" => 60 * 1_000_000_000,
			"h" => 3600 * 1_000_000_000,
			"" => return Err("missing unit"),
			_ => return Err("unknown unit"),
		};

		let whole: u128 = if int_part.is_empty() {
			0
		} else {
			int_part.parse().map_err(|_| "duration out of range")?
		};
		let mut nanos = whole.checked_mul(scale).ok_or("duration out of range")?;

		let mut digit_scale = scale;
		for digit in frac_part.bytes() {
			digit_scale /= 10;
			if digit_scale == 0 {
				break;
			}
			nanos += u128::from(digit - b'0') * digit_scale;
		}

		total = total.checked_add(nanos).ok_or("duration out of range")?;
		s = rest;
	}

	let nanos = u64::try_from(total).map_err(|_| "duration out of range")?;
	Ok(Duration::from_nanos(nanos))
}


// vim: ts=4
