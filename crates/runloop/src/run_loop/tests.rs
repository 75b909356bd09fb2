use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::*;
use crate::next_owner_id;

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
	let log = Arc::new(Mutex::new(Vec::new()));
	let log_clone = Arc::clone(&log);
	let make = move |label: &'static str| -> Task {
		let log = Arc::clone(&log_clone);
		Box::new(move || log.lock().push(label))
	};
	(log, make)
}

#[test]
fn nothing_runs_before_tick() {
	let rl = RunLoop::new();
	let count = Arc::new(AtomicUsize::new(0));
	let c = Arc::clone(&count);
	rl.schedule(Phase::Actions, Box::new(move || {
		c.fetch_add(1, Ordering::SeqCst);
	}));

	assert_eq!(count.load(Ordering::SeqCst), 0);
	assert_eq!(rl.pending(), 1);

	let report = rl.run_tick();
	assert_eq!(report, TickReport { tick: 1, ran: 1, deferred: 0 });
	assert_eq!(count.load(Ordering::SeqCst), 1);
	assert!(rl.is_idle());
}

#[test]
fn phases_run_in_order() {
	let rl = RunLoop::new();
	let (log, task) = recorder();

	rl.schedule(Phase::Destroy, task("destroy"));
	rl.schedule(Phase::AfterRender, task("after-render"));
	rl.schedule(Phase::Sync, task("sync"));
	rl.schedule(Phase::Render, task("render"));
	rl.schedule(Phase::AfterRender, task("after-render-2"));

	rl.run_tick();
	assert_eq!(*log.lock(), vec!["sync", "render", "after-render", "after-render-2", "destroy"]);
}

#[test]
fn schedule_once_coalesces_within_tick() {
	let rl = RunLoop::new();
	let (log, task) = recorder();
	let key = OnceKey::new(next_owner_id(), "flush");

	assert!(rl.schedule_once(Phase::AfterRender, key, task("first")));
	assert!(!rl.schedule_once(Phase::AfterRender, key, task("second")));
	assert!(!rl.schedule_once(Phase::AfterRender, key, task("third")));
	assert_eq!(rl.coalesced_total(), 2);

	rl.run_tick();
	assert_eq!(*log.lock(), vec!["first"]);
}

#[test]
fn schedule_once_distinguishes_owner_and_phase() {
	let rl = RunLoop::new();
	let (log, task) = recorder();
	let a = OnceKey::new(next_owner_id(), "flush");
	let b = OnceKey::new(next_owner_id(), "flush");

	assert!(rl.schedule_once(Phase::AfterRender, a, task("a")));
	assert!(rl.schedule_once(Phase::AfterRender, b, task("b")));
	assert!(rl.schedule_once(Phase::Render, a, task("a-render")));

	rl.run_tick();
	assert_eq!(*log.lock(), vec!["a-render", "a", "b"]);
}

#[test]
fn schedule_once_rearms_after_tick() {
	let rl = RunLoop::new();
	let (log, task) = recorder();
	let key = OnceKey::new(next_owner_id(), "flush");

	assert!(rl.schedule_once(Phase::AfterRender, key, task("tick-1")));
	rl.run_tick();
	assert!(rl.schedule_once(Phase::AfterRender, key, task("tick-2")));
	rl.run_tick();

	assert_eq!(*log.lock(), vec!["tick-1", "tick-2"]);
}

#[test]
fn tasks_scheduled_during_tick_run_next_tick() {
	let rl = RunLoop::new();
	let (log, task) = recorder();
	let key = OnceKey::new(next_owner_id(), "flush");

	let inner = rl.clone();
	let nested = task("nested");
	let nested_once = task("nested-once");
	rl.schedule_once(Phase::Sync, key, Box::new(move || {
		inner.schedule(Phase::Destroy, nested);
		// same key, but the current tick already released it
		assert!(inner.schedule_once(Phase::Sync, key, nested_once));
	}));

	let first = rl.run_tick();
	assert_eq!(first.ran, 1);
	assert_eq!(first.deferred, 2);
	assert!(log.lock().is_empty());

	let second = rl.run_tick();
	assert_eq!(second.tick, 2);
	assert_eq!(second.ran, 2);
	assert_eq!(*log.lock(), vec!["nested-once", "nested"]);
}

#[test]
fn run_until_idle_follows_chains() {
	let rl = RunLoop::new();
	let count = Arc::new(AtomicUsize::new(0));

	fn chain(rl: RunLoop, count: Arc<AtomicUsize>, remaining: usize) -> Task {
		Box::new(move || {
			count.fetch_add(1, Ordering::SeqCst);
			if remaining > 0 {
				let next = chain(rl.clone(), Arc::clone(&count), remaining - 1);
				rl.schedule(Phase::Actions, next);
			}
		})
	}

	rl.schedule(Phase::Actions, chain(rl.clone(), Arc::clone(&count), 3));
	let reports = rl.run_until_idle(10);
	assert_eq!(reports.len(), 4);
	assert_eq!(count.load(Ordering::SeqCst), 4);

	rl.schedule(Phase::Actions, chain(rl.clone(), Arc::clone(&count), 5));
	let reports = rl.run_until_idle(2);
	assert_eq!(reports.len(), 2);
	assert!(!rl.is_idle());
}
