use std::sync::atomic::{AtomicU64, Ordering};

use crate::Phase;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identity of a once-per-tick task.
///
/// `owner` distinguishes independent callers sharing one scheduler, `name`
/// distinguishes hooks registered by the same owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnceKey {
	owner: u64,
	name: &'static str,
}

impl OnceKey {
	/// Creates a key for `name` registered by `owner`.
	pub const fn new(owner: u64, name: &'static str) -> Self {
		Self { owner, name }
	}

	/// Returns the owning instance ID.
	pub const fn owner(&self) -> u64 {
		self.owner
	}

	/// Returns the hook name.
	pub const fn name(&self) -> &'static str {
		self.name
	}
}

/// Allocates a process-unique owner ID for [`OnceKey`]s.
pub fn next_owner_id() -> u64 {
	static NEXT: AtomicU64 = AtomicU64::new(0);
	NEXT.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Host scheduler interface: "run this before the next frame".
pub trait Scheduler: Send + Sync {
	/// Queues `task` to run during `phase` of the next tick.
	fn schedule(&self, phase: Phase, task: Task);

	/// Queues `task` unless a task with the same `(phase, key)` is already
	/// queued for the next tick.
	///
	/// Returns `true` if `task` was queued, `false` if it was coalesced into
	/// the existing one (and dropped).
	fn schedule_once(&self, phase: Phase, key: OnceKey, task: Task) -> bool;
}
