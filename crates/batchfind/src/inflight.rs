//! Tracking of bulk fetches that have started but not yet fanned out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
	count: AtomicUsize,
	idle: Notify,
}

impl InFlight {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Registers one fetch; it stays counted until the guard drops.
	pub fn begin(self: &Arc<Self>) -> InFlightGuard {
		self.count.fetch_add(1, Ordering::AcqRel);
		InFlightGuard { tracker: Arc::clone(self) }
	}

	pub fn len(&self) -> usize {
		self.count.load(Ordering::Acquire)
	}

	/// Waits until no fetch is in flight.
	pub async fn wait_idle(&self) {
		loop {
			// Register before checking the count to avoid a lost wakeup.
			let notified = self.idle.notified();
			tokio::pin!(notified);
			notified.as_mut().enable();

			if self.len() == 0 {
				return;
			}
			notified.await;
		}
	}
}

/// RAII registration of one in-flight fetch. Also released if the fetch task
/// panics or is aborted.
pub(crate) struct InFlightGuard {
	tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		if self.tracker.count.fetch_sub(1, Ordering::AcqRel) == 1 {
			self.tracker.idle.notify_waiters();
		}
	}
}
