//! Common utilities for batchfind integration tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use batchfind::memory::{FindCall, MemoryStore};
use batchfind::{BatchConfig, BatchFinder};
use batchfind_runloop::RunLoop;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
	pub first_name: String,
}

pub fn user(first_name: &str) -> User {
	User {
		first_name: first_name.to_owned(),
	}
}

pub type UserStore = MemoryStore<User>;

/// Test harness wiring a finder to a manually ticked run loop.
pub struct Harness {
	pub run_loop: RunLoop,
	pub store: Arc<UserStore>,
	pub finder: BatchFinder<UserStore>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(BatchConfig::default())
	}

	pub fn with_config(config: BatchConfig) -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let run_loop = RunLoop::new();
		let store = Arc::new(MemoryStore::new());
		let finder = BatchFinder::with_config(Arc::clone(&store), run_loop.clone(), config);
		Self { run_loop, store, finder }
	}

	/// Runs one tick and waits for the fetches it started.
	pub async fn tick(&self) {
		self.run_loop.run_tick();
		self.finder.settle().await;
	}
}

/// Ids of one recorded call as a set of strings.
pub fn id_set(call: &FindCall) -> BTreeSet<String> {
	call.ids.iter().map(|id| id.as_str().to_owned()).collect()
}
