//! Interval driver standing in for a host render loop.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::RunLoop;

/// Handle to a running tick driver.
///
/// Dropping the handle does not stop the driver; call [`Self::shutdown`].
#[derive(Debug)]
pub struct DriverHandle {
	cancel: CancellationToken,
	join: JoinHandle<u64>,
}

impl DriverHandle {
	/// Returns true if shutdown has been requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests shutdown without waiting.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Stops the driver and waits for it to exit.
	///
	/// Returns the number of ticks the driver ran.
	pub async fn shutdown(self) -> u64 {
		self.cancel.cancel();
		match self.join.await {
			Ok(ticks) => ticks,
			Err(error) => {
				tracing::warn!(%error, "runloop.driver.join_failed");
				0
			}
		}
	}
}

impl RunLoop {
	/// Spawns a task on the current tokio runtime that calls
	/// [`RunLoop::run_tick`] every configured interval.
	///
	/// # Panics
	///
	/// Panics if called outside a tokio runtime.
	pub fn spawn_driver(&self) -> DriverHandle {
		let cancel = CancellationToken::new();
		let token = cancel.clone();
		let run_loop = self.clone();
		let interval = self.config().tick_interval();

		let join = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			tracing::debug!(interval = ?interval, "runloop.driver.started");

			let mut ticks = 0u64;
			loop {
				tokio::select! {
					_ = token.cancelled() => break,
					_ = ticker.tick() => {
						run_loop.run_tick();
						ticks += 1;
					}
				}
			}

			tracing::debug!(ticks, "runloop.driver.stopped");
			ticks
		});

		DriverHandle { cancel, join }
	}
}
