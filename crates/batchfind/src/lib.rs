//! Per-tick lookup coalescing.
//!
//! [`BatchFinder::lookup`] returns a [`ResultHandle`] immediately. Lookups that
//! miss the store's cache are queued by `(type, id)`; at the next tick boundary
//! a single flush hook drains the queue and issues one bulk
//! [`EntityStore::find`] per resource type, then fans the result back out to
//! every waiting handle.
//!
//! ```text
//! lookup ──┬─ cache hit ──► schedule(cache-hit phase) ──────────────┐
//!          └─ miss ──► queues[type][id].push ──► arm flush hook     │
//!                                                  │ (once per tick) │
//!                         tick boundary ──► drain_all               ▼
//!                                           └─► find(type, ids) ──► resolve handles
//! ```
//!
//! # Timing
//!
//! No handle resolves synchronously. Cache hits are delivered through the
//! scheduler too, so callers can attach continuations right after `lookup`
//! and observe the same ordering for hits and misses.
//!
//! # Failures
//!
//! Ids the store cannot produce resolve to `Ok(None)`. A bulk fetch that
//! fails outright is handled per [`FailurePolicy`]: every handle of that type
//! receives [`LookupError::Fetch`] by default, or stays pending under
//! [`FailurePolicy::Stall`].

mod config;
mod error;
mod finder;
mod handle;
mod id;
mod inflight;
pub mod memory;
mod registry;
mod store;

pub use batchfind_runloop::{ConfigError, Phase, Scheduler};
pub use config::{BatchConfig, FailurePolicy};
pub use error::{LookupError, Resolution};
pub use finder::{BatchFinder, FinderStats};
pub use handle::ResultHandle;
pub use id::{EntityId, ResourceType};
pub use store::{EntityStore, StoreError};
