//! Lookup coalescer.
//!
//! # Design
//!
//! A [`BatchFinder`] owns its pending-lookup queues; nothing is process-global,
//! so independent finders (per store, per session, per test) never observe each
//! other's lookups even when they share one [`Scheduler`].
//!
//! - **Lookup**: cache hits are scheduled for delivery in the cache-hit phase.
//!   Misses are appended to `queues[type][id]` and arm the flush hook.
//! - **Flush hook**: requested with [`Scheduler::schedule_once`] on every miss;
//!   the scheduler keeps at most one per tick. A hook dropped without running
//!   is replaced by the next miss. Disarming and draining happen under one
//!   lock, so a lookup either lands in the current drain or waits for the hook
//!   of the next tick.
//! - **Bulk resolver**: one tokio task per drained type calls
//!   [`EntityStore::find`] with every distinct id, then re-reads each id from
//!   the store cache and resolves its completions in enqueue order.
//!
//! Lookups issued while a fetch is in flight, including from continuations of
//! handles resolved by that fetch, are queued for the next flush.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use batchfind_runloop::{OnceKey, Scheduler, next_owner_id};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinError;

use crate::handle::Completion;
use crate::inflight::InFlight;
use crate::registry::{TaskQueues, TypeBatch, Waiters};
use crate::{BatchConfig, EntityId, EntityStore, FailurePolicy, LookupError, ResourceType, ResultHandle, StoreError};

/// Name of the flush hook's [`OnceKey`].
const FLUSH_HOOK: &str = "batchfind.flush";

/// Coalesces per-id lookups into one bulk fetch per type per tick.
///
/// Cheap to clone; clones share queues and counters.
pub struct BatchFinder<S: EntityStore> {
	inner: Arc<Inner<S>>,
}

impl<S: EntityStore> Clone for BatchFinder<S> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

struct Inner<S: EntityStore> {
	store: Arc<S>,
	scheduler: Arc<dyn Scheduler>,
	config: BatchConfig,
	/// Owner ID for this finder's [`OnceKey`]s.
	owner: u64,
	/// Runtime captured at construction, used when a flush runs outside one.
	runtime: Option<Handle>,
	state: Mutex<FinderState<S::Entity>>,
	in_flight: Arc<InFlight>,
	counters: Counters,
}

struct FinderState<E> {
	queues: TaskQueues<E>,
	/// Set by a queued miss, cleared when a drain runs.
	armed: bool,
	/// Completions parked by [`FailurePolicy::Stall`].
	stalled: Vec<Completion<E>>,
}

#[derive(Default)]
struct Counters {
	lookups: AtomicU64,
	cache_hits: AtomicU64,
	flushes: AtomicU64,
	bulk_fetches: AtomicU64,
	failed_fetches: AtomicU64,
}

/// Snapshot of finder activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinderStats {
	/// Total lookups issued.
	pub lookups: u64,
	/// Lookups served from the store cache.
	pub cache_hits: u64,
	/// Flushes that drained at least one type.
	pub flushes: u64,
	/// Bulk fetches started.
	pub bulk_fetches: u64,
	/// Bulk fetches that failed as a whole.
	pub failed_fetches: u64,
}

impl<S: EntityStore> BatchFinder<S> {
	/// Creates a finder with default configuration.
	pub fn new(store: Arc<S>, scheduler: impl Scheduler + 'static) -> Self {
		Self::with_config(store, scheduler, BatchConfig::default())
	}

	/// Creates a finder with the given configuration.
	///
	/// If called inside a tokio runtime, that runtime also serves flushes that
	/// are triggered from threads without one.
	pub fn with_config(store: Arc<S>, scheduler: impl Scheduler + 'static, config: BatchConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				store,
				scheduler: Arc::new(scheduler),
				config,
				owner: next_owner_id(),
				runtime: Handle::try_current().ok(),
				state: Mutex::new(FinderState {
					queues: TaskQueues::new(),
					armed: false,
					stalled: Vec::new(),
				}),
				in_flight: InFlight::new(),
				counters: Counters::default(),
			}),
		}
	}

	/// Requests `(kind, id)`.
	///
	/// Never resolves synchronously: a cache hit is delivered in the
	/// configured cache-hit phase of the next tick, a miss once the bulk fetch
	/// issued at the next flush completes.
	pub fn lookup(&self, kind: impl Into<ResourceType>, id: impl Into<EntityId>) -> ResultHandle<S::Entity> {
		let inner = &self.inner;
		let kind = kind.into();
		let id = id.into();
		inner.counters.lookups.fetch_add(1, Ordering::Relaxed);
		let (handle, completion) = ResultHandle::pending(kind.clone(), id.clone());

		if let Some(entity) = inner.store.get_by_id(&kind, &id) {
			inner.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
			tracing::trace!(kind = %kind, id = %id, path = "hit", "batch.lookup");
			inner
				.scheduler
				.schedule(inner.config.cache_hit_phase, Box::new(move || completion.resolve(Ok(Some(entity)))));
			return handle;
		}

		let first = {
			let mut state = inner.state.lock();
			state.queues.push(kind.clone(), id.clone(), completion);
			!std::mem::replace(&mut state.armed, true)
		};
		tracing::trace!(kind = %kind, id = %id, path = "queued", first, "batch.lookup");
		// Every miss re-requests the hook; the once-key dedupes within a tick,
		// and a hook the scheduler dropped unrun is replaced.
		self.arm_flush();
		handle
	}

	/// Drains every queued lookup now, without waiting for the scheduler.
	///
	/// Returns the number of bulk fetches started. The scheduled hook, if
	/// armed, finds nothing left to drain.
	pub fn flush(&self) -> usize {
		self.inner.drain_all()
	}

	/// Waits until every bulk fetch started so far has fanned out.
	///
	/// Lookups still queued for a future flush are not waited for.
	pub async fn settle(&self) {
		self.inner.in_flight.wait_idle().await;
	}

	/// Number of lookups queued for the next flush.
	pub fn pending_count(&self) -> usize {
		self.inner.state.lock().queues.len()
	}

	/// Number of distinct ids of `kind` queued for the next flush.
	pub fn pending_ids(&self, kind: impl Into<ResourceType>) -> usize {
		self.inner.state.lock().queues.ids_for(&kind.into())
	}

	/// Returns true if nothing is queued and no fetch is in flight.
	pub fn is_idle(&self) -> bool {
		self.inner.state.lock().queues.is_empty() && self.inner.in_flight.len() == 0
	}

	/// Number of bulk fetches currently in flight.
	pub fn in_flight(&self) -> usize {
		self.inner.in_flight.len()
	}

	/// Number of lookups parked by [`FailurePolicy::Stall`].
	pub fn stalled_count(&self) -> usize {
		self.inner.state.lock().stalled.len()
	}

	/// Whether lookups queued since the last drain are waiting for a flush.
	pub fn is_armed(&self) -> bool {
		self.inner.state.lock().armed
	}

	/// Returns an activity snapshot.
	pub fn stats(&self) -> FinderStats {
		let c = &self.inner.counters;
		FinderStats {
			lookups: c.lookups.load(Ordering::Relaxed),
			cache_hits: c.cache_hits.load(Ordering::Relaxed),
			flushes: c.flushes.load(Ordering::Relaxed),
			bulk_fetches: c.bulk_fetches.load(Ordering::Relaxed),
			failed_fetches: c.failed_fetches.load(Ordering::Relaxed),
		}
	}

	/// Returns the configuration.
	pub fn config(&self) -> &BatchConfig {
		&self.inner.config
	}

	/// Returns the underlying store.
	pub fn store(&self) -> &Arc<S> {
		&self.inner.store
	}

	fn arm_flush(&self) {
		let inner: Weak<Inner<S>> = Arc::downgrade(&self.inner);
		let key = OnceKey::new(self.inner.owner, FLUSH_HOOK);
		let hook = Box::new(move || {
			if let Some(inner) = inner.upgrade() {
				inner.drain_all();
			}
		});
		if !self.inner.scheduler.schedule_once(self.inner.config.flush_phase, key, hook) {
			tracing::trace!(owner = self.inner.owner, "batch.flush.already_queued");
		}
	}
}

impl<S: EntityStore> Inner<S> {
	fn drain_all(self: &Arc<Self>) -> usize {
		let batches = {
			let mut state = self.state.lock();
			state.armed = false;
			state.queues.drain()
		};
		if batches.is_empty() {
			return 0;
		}

		self.counters.flushes.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(
			owner = self.owner,
			types = batches.len(),
			lookups = batches.iter().map(TypeBatch::completions).sum::<usize>(),
			"batch.flush"
		);

		let started = batches.len();
		for batch in batches {
			self.flush_type(batch);
		}
		started
	}

	fn flush_type(self: &Arc<Self>, batch: TypeBatch<S::Entity>) {
		let ids = batch.ids();
		let TypeBatch { kind, waiters } = batch;
		self.counters.bulk_fetches.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(kind = %kind, ids = ids.len(), "batch.fetch.start");

		let Some(runtime) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
			let err = StoreError::Unavailable("no tokio runtime to drive the bulk fetch".to_owned());
			self.settle_failed(kind, waiters, err);
			return;
		};

		let guard = self.in_flight.begin();
		let store = Arc::clone(&self.store);
		let fetch_kind = kind.clone();
		let fetch = runtime.spawn(async move { store.find(&fetch_kind, &ids).await });

		let inner = Arc::clone(self);
		runtime.spawn(async move {
			let _guard = guard;
			let outcome = fetch.await.unwrap_or_else(|err| Err(StoreError::Panicked(join_error_message(err))));
			match outcome {
				Ok(found) => inner.fan_out(&kind, waiters, found.len()),
				Err(err) => inner.settle_failed(kind, waiters, err),
			}
		});
	}

	/// Resolves every waiter from the store cache populated by the fetch.
	fn fan_out(&self, kind: &ResourceType, waiters: Waiters<S::Entity>, returned: usize) {
		let ids = waiters.len();
		let mut missing = 0usize;
		for (id, completions) in waiters {
			let entity = self.store.get_by_id(kind, &id);
			if entity.is_none() {
				missing += 1;
			}
			for completion in completions {
				completion.resolve(Ok(entity.clone()));
			}
		}
		tracing::debug!(kind = %kind, ids, returned, missing, "batch.fetch.complete");
	}

	fn settle_failed(&self, kind: ResourceType, waiters: Waiters<S::Entity>, err: StoreError) {
		self.counters.failed_fetches.fetch_add(1, Ordering::Relaxed);
		let completions = waiters.into_values().flatten();

		match self.config.on_fetch_error {
			FailurePolicy::Reject => {
				tracing::warn!(kind = %kind, error = %err, policy = "reject", "batch.fetch.failed");
				let source = Arc::new(err);
				for completion in completions {
					completion.resolve(Err(LookupError::Fetch {
						kind: kind.clone(),
						source: Arc::clone(&source),
					}));
				}
			}
			FailurePolicy::Stall => {
				let mut state = self.state.lock();
				let before = state.stalled.len();
				state.stalled.extend(completions);
				tracing::warn!(
					kind = %kind,
					error = %err,
					policy = "stall",
					stalled = state.stalled.len() - before,
					"batch.fetch.failed"
				);
			}
		}
	}
}

/// Extracts a panic message from a failed fetch task.
fn join_error_message(err: JoinError) -> String {
	if !err.is_panic() {
		return "fetch task cancelled".to_owned();
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_owned()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"fetch task panicked".to_owned()
	}
}
