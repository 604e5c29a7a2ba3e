//! Reaper
//!
//! Background task that periodically sweeps expired records out of the ban
//! table until its cancellation token fires.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
use crate::table::BanTable;

pub struct Reaper {
	handle: JoinHandle<()>,
	shutdown: CancellationToken,
	sweeps: Arc<AtomicU64>,
}

impl Reaper {
	/// Start sweeping `table` every `interval`.
	///
	/// Must be called from within a Tokio runtime. The wait restarts after
	/// each sweep, so ticks drift by the sweep duration.
	pub fn spawn(table: Arc<BanTable>, interval: Duration, shutdown: CancellationToken) -> Self {
		let sweeps = Arc::new(AtomicU64::new(0));
		let counter = sweeps.clone();
		let token = shutdown.clone();

		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					biased;
					() = token.cancelled() => {
						debug!("Reaper stopped");
						break;
					}
					() = tokio::time::sleep(interval) => {
						debug!("Cleaning up stale clients...");
						let removed = table.sweep(Instant::now());
						counter.fetch_add(1, Ordering::Relaxed);
						if removed > 0 {
							debug!("Swept {} stale clients, {} remaining", removed, table.len());
						}
					}
				}
			}
		});

		Self { handle, shutdown, sweeps }
	}

	/// Number of completed sweeps
	pub fn sweeps(&self) -> u64 {
		self.sweeps.load(Ordering::Relaxed)
	}

	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Cancel the task and wait for it to exit
	pub async fn stop(self) {
		self.shutdown.cancel();
		if let Err(e) = self.handle.await {
			warn!("Reaper task failed: {}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BAN_TIME: Duration = Duration::from_secs(4);
	const INTERVAL: Duration = Duration::from_secs(1);

	#[tokio::test(start_paused = true)]
	async fn test_sweeps_expired_records() {
		let table = Arc::new(BanTable::new(3, BAN_TIME));
		let reaper = Reaper::spawn(table.clone(), INTERVAL, CancellationToken::new());

		table.record_failure("1");
		for _ in 0..3 {
			table.record_failure("2");
		}

		// At exactly BAN_TIME the records are still inside their window
		tokio::time::sleep(BAN_TIME + INTERVAL / 2).await;
		assert_eq!(table.len(), 2);

		tokio::time::sleep(INTERVAL).await;
		assert!(table.is_empty());
		assert!(reaper.sweeps() >= 5);

		reaper.stop().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_keeps_active_records() {
		let table = Arc::new(BanTable::new(3, BAN_TIME));
		let reaper = Reaper::spawn(table.clone(), INTERVAL, CancellationToken::new());

		table.record_failure("stale");
		tokio::time::sleep(Duration::from_secs(3)).await;
		table.record_failure("active");

		tokio::time::sleep(Duration::from_millis(2500)).await;
		assert!(table.get("stale").is_none());
		assert!(table.get("active").is_some());

		reaper.stop().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_stops_on_cancel() {
		let table = Arc::new(BanTable::new(3, BAN_TIME));
		let shutdown = CancellationToken::new();
		let reaper = Reaper::spawn(table.clone(), INTERVAL, shutdown.clone());

		tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
		let sweeps = reaper.sweeps();
		assert_eq!(sweeps, 2);

		shutdown.cancel();
		tokio::time::sleep(INTERVAL).await;
		assert!(reaper.is_finished());

		// No sweep after cancellation, even with expired records present
		table.record_failure("late");
		tokio::time::sleep(BAN_TIME * 3).await;
		assert_eq!(reaper.sweeps(), sweeps);
		assert_eq!(table.len(), 1);
	}

	#[tokio::test]
	async fn test_already_cancelled_token() {
		let table = Arc::new(BanTable::new(3, BAN_TIME));
		let shutdown = CancellationToken::new();
		shutdown.cancel();

		let reaper = Reaper::spawn(table, INTERVAL, shutdown);
		tokio::time::timeout(INTERVAL, reaper.stop()).await.unwrap();
	}
}

// vim: ts=4
