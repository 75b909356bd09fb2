//! Finder driven by the interval run loop driver instead of manual ticks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use batchfind::BatchFinder;
use batchfind::memory::MemoryStore;
use batchfind_runloop::{RunLoop, RunLoopConfig};
use common::{User, user};

#[tokio::test]
async fn driver_ticks_flush_lookups() {
	let _ = tracing_subscriber::fmt::try_init();
	let run_loop = RunLoop::with_config(RunLoopConfig { tick_interval_ms: 2 });
	let store: Arc<MemoryStore<User>> = Arc::new(MemoryStore::new());
	for id in 1..=10u32 {
		store.insert_remote("user", id, user(&format!("u{id}")));
	}
	let finder = BatchFinder::new(Arc::clone(&store), run_loop.clone());

	let handles: Vec<_> = (1..=10u32).map(|id| finder.lookup("user", id)).collect();
	let driver = run_loop.spawn_driver();

	for (n, handle) in handles.into_iter().enumerate() {
		let resolved = tokio::time::timeout(Duration::from_secs(5), handle)
			.await
			.expect("driver should flush")
			.unwrap();
		assert_eq!(resolved, Some(user(&format!("u{}", n + 1))));
	}

	// All ten were queued before the first tick.
	assert_eq!(store.find_calls().len(), 1);
	assert!(driver.shutdown().await >= 1);
	assert!(finder.is_idle());
}
