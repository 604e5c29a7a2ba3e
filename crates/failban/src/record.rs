//! Per-client failure record

use std::time::Duration;

use tokio::time::Instant;

/// Failure state tracked for one client identity.
///
/// A record only exists once the client produced at least one bad response,
/// so `fail_count` is never zero while stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRecord {
	pub fail_count: u32,
	/// Time of the most recent failure or ban extension
	pub last_seen: Instant,
}

impl ClientRecord {
	pub fn new(now: Instant) -> Self {
		Self { fail_count: 1, last_seen: now }
	}

	/// Count another offense at `now`
	pub fn bump(&mut self, now: Instant) {
		self.fail_count = self.fail_count.saturating_add(1);
		self.last_seen = now;
	}

	/// When the ban window measured from `last_seen` ends.
	/// `None` if it lies beyond the clock's range.
	pub fn expires_at(&self, ban_time: Duration) -> Option<Instant> {
		self.last_seen.checked_add(ban_time)
	}

	/// Whether the window has fully elapsed. The exact boundary still counts
	/// as inside the window.
	pub fn has_expired(&self, now: Instant, ban_time: Duration) -> bool {
		self.expires_at(ban_time).is_some_and(|expires| now > expires)
	}

	pub fn is_over_threshold(&self, max_fails: u32) -> bool {
		self.fail_count >= max_fails
	}
}


// vim: ts=4
