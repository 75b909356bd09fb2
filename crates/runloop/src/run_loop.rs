//! Tick-driven task queues.
//!
//! [`RunLoop`] is the reference [`Scheduler`]. The host (a render loop, a test,
//! or the interval driver) calls [`RunLoop::run_tick`] to flush everything
//! queued since the previous tick, phase by phase.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{OnceKey, Phase, RunLoopConfig, Scheduler, Task};

/// Tasks queued for one tick.
#[derive(Default)]
struct PhaseQueues {
	tasks: [Vec<Task>; Phase::COUNT],
	once: HashSet<(Phase, OnceKey)>,
}

impl PhaseQueues {
	fn len(&self) -> usize {
		self.tasks.iter().map(Vec::len).sum()
	}
}

struct RunLoopState {
	queues: PhaseQueues,
	/// Number of ticks started.
	tick: u64,
	/// Total tasks queued.
	scheduled_total: u64,
	/// Total `schedule_once` requests absorbed by an already-queued key.
	coalesced_total: u64,
}

/// Outcome of one [`RunLoop::run_tick`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
	/// Sequence number of the tick, starting at 1.
	pub tick: u64,
	/// Tasks executed during the tick.
	pub ran: usize,
	/// Tasks queued for the following tick while this one ran.
	pub deferred: usize,
}

/// Phased, coalescing tick scheduler.
///
/// Cheap to clone; clones share the same queues.
#[derive(Clone)]
pub struct RunLoop {
	inner: Arc<Mutex<RunLoopState>>,
	config: RunLoopConfig,
}

impl Default for RunLoop {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for RunLoop {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.lock();
		f.debug_struct("RunLoop")
			.field("tick", &state.tick)
			.field("pending", &state.queues.len())
			.field("config", &self.config)
			.finish()
	}
}

impl RunLoop {
	/// Creates a run loop with default configuration.
	pub fn new() -> Self {
		Self::with_config(RunLoopConfig::default())
	}

	/// Creates a run loop with the given configuration.
	pub fn with_config(config: RunLoopConfig) -> Self {
		Self {
			inner: Arc::new(Mutex::new(RunLoopState {
				queues: PhaseQueues::default(),
				tick: 0,
				scheduled_total: 0,
				coalesced_total: 0,
			})),
			config,
		}
	}

	/// Returns the configuration.
	pub fn config(&self) -> &RunLoopConfig {
		&self.config
	}

	/// Runs every task queued so far, in phase order.
	///
	/// The queues are swapped out before any task runs, so tasks scheduled
	/// from inside this tick are deferred to the next one.
	pub fn run_tick(&self) -> TickReport {
		let (queues, tick) = {
			let mut state = self.inner.lock();
			state.tick += 1;
			(std::mem::take(&mut state.queues), state.tick)
		};

		let mut ran = 0;
		for (phase, tasks) in Phase::ALL.into_iter().zip(queues.tasks) {
			if tasks.is_empty() {
				continue;
			}
			tracing::trace!(tick, phase = %phase, tasks = tasks.len(), "runloop.phase");
			for task in tasks {
				task();
				ran += 1;
			}
		}

		let deferred = self.pending();
		if ran > 0 || deferred > 0 {
			tracing::trace!(tick, ran, deferred, "runloop.tick");
		}
		TickReport { tick, ran, deferred }
	}

	/// Runs ticks until no task is queued, up to `max_ticks`.
	///
	/// Returns the reports of the ticks that ran.
	pub fn run_until_idle(&self, max_ticks: usize) -> Vec<TickReport> {
		let mut reports = Vec::new();
		while reports.len() < max_ticks && !self.is_idle() {
			reports.push(self.run_tick());
		}
		if !self.is_idle() {
			tracing::warn!(max_ticks, pending = self.pending(), "run loop still busy after tick limit");
		}
		reports
	}

	/// Returns the number of tasks queued for the next tick.
	pub fn pending(&self) -> usize {
		self.inner.lock().queues.len()
	}

	/// Returns true if nothing is queued.
	pub fn is_idle(&self) -> bool {
		self.pending() == 0
	}

	/// Returns the number of ticks started so far.
	pub fn tick_count(&self) -> u64 {
		self.inner.lock().tick
	}

	/// Returns total tasks queued.
	pub fn scheduled_total(&self) -> u64 {
		self.inner.lock().scheduled_total
	}

	/// Returns total `schedule_once` requests that were coalesced.
	pub fn coalesced_total(&self) -> u64 {
		self.inner.lock().coalesced_total
	}
}

impl Scheduler for RunLoop {
	fn schedule(&self, phase: Phase, task: Task) {
		let mut state = self.inner.lock();
		state.queues.tasks[phase.index()].push(task);
		state.scheduled_total += 1;
	}

	fn schedule_once(&self, phase: Phase, key: OnceKey, task: Task) -> bool {
		let mut state = self.inner.lock();
		if !state.queues.once.insert((phase, key)) {
			state.coalesced_total += 1;
			tracing::trace!(phase = %phase, owner = key.owner(), hook = key.name(), "runloop.schedule_once.coalesced");
			return false;
		}
		state.queues.tasks[phase.index()].push(task);
		state.scheduled_total += 1;
		true
	}
}

#[cfg(test)]
mod tests;
