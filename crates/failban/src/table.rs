//! Ban Table
//!
//! Shared map from client identity to its failure record. Every operation
//! takes the lock once and holds it for the whole check-then-mutate
//! sequence, so concurrent requests and the reaper never observe a
//! half-applied update.
//!
//! State per client: unseen (no record) -> tracked (below threshold) ->
//! banned (at or above threshold, window open) -> expired (window elapsed,
//! record dropped on next check or sweep).

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::prelude::*;
use crate::record::ClientRecord;

/// Point-in-time counts over the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BanTableStats {
	/// Clients with a record, banned or not
	pub tracked_clients: usize,
	/// Clients at or above the threshold whose window is still open
	pub banned_clients: usize,
}

pub struct BanTable {
	clients: Mutex<HashMap<Box<str>, ClientRecord>>,
	max_fails: u32,
	ban_time: Duration,
}

impl BanTable {
	pub fn new(max_fails: u32, ban_time: Duration) -> Self {
		Self { clients: Mutex::new(HashMap::new()), max_fails, ban_time }
	}

	pub fn max_fails(&self) -> u32 {
		self.max_fails
	}

	pub fn ban_time(&self) -> Duration {
		self.ban_time
	}

	/// Check whether `client` is currently banned.
	///
	/// A banned client that keeps sending requests has its ban extended by
	/// each of them. An expired ban is lifted here without waiting for the
	/// reaper.
	pub fn is_banned(&self, client: &str) -> bool {
		self.is_banned_at(client, Instant::now())
	}

	pub fn is_banned_at(&self, client: &str, now: Instant) -> bool {
		let mut clients = self.clients.lock();
		debug!("Checking ban state for {}", client);

		let Some(record) = clients.get_mut(client) else {
			return false;
		};
		if !record.is_over_threshold(self.max_fails) {
			return false;
		}

		if record.has_expired(now, self.ban_time) {
			info!("Un-banned {}", client);
			clients.remove(client);
			false
		} else {
			record.bump(now);
			info!("Extended ban for {} (failures: {})", client, record.fail_count);
			true
		}
	}

	/// Count a bad response for `client`
	pub fn record_failure(&self, client: &str) {
		self.record_failure_at(client, Instant::now());
	}

	pub fn record_failure_at(&self, client: &str, now: Instant) {
		let mut clients = self.clients.lock();
		if let Some(record) = clients.get_mut(client) {
			record.bump(now);
			debug!("Increment {} (failures: {})", client, record.fail_count);
		} else {
			clients.insert(client.into(), ClientRecord::new(now));
			debug!("Tracking {} (failures: 1)", client);
		}
	}

	/// Drop every record whose window has elapsed at `now`, banned or not.
	/// Returns the number of records removed.
	pub fn sweep(&self, now: Instant) -> usize {
		let ban_time = self.ban_time;
		let mut clients = self.clients.lock();
		let before = clients.len();

		clients.retain(|client, record| {
			if record.has_expired(now, ban_time) {
				info!("{} is no longer banned", client);
				false
			} else {
				debug!("{} is still tracked", client);
				true
			}
		});

		before - clients.len()
	}

	/// Copy of the record held for `client`
	pub fn get(&self, client: &str) -> Option<ClientRecord> {
		self.clients.lock().get(client).copied()
	}

	pub fn len(&self) -> usize {
		self.clients.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.lock().is_empty()
	}

	pub fn stats(&self) -> BanTableStats {
		self.stats_at(Instant::now())
	}

	pub fn stats_at(&self, now: Instant) -> BanTableStats {
		let clients = self.clients.lock();
		let banned_clients = clients
			.values()
			.filter(|r| r.is_over_threshold(self.max_fails) && !r.has_expired(now, self.ban_time))
			.count();

		BanTableStats { tracked_clients: clients.len(), banned_clients }
	}
}


// vim: ts=4
