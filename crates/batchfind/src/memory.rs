//! In-memory [`EntityStore`].
//!
//! Entities live in two tiers: a *remote* tier standing in for the backend,
//! and a *cache* tier that [`EntityStore::get_by_id`] reads. A bulk
//! [`EntityStore::find`] copies the requested ids from remote into cache,
//! which is exactly the side effect the finder relies on.
//!
//! Every `find` call is recorded, and per-type failures or delays can be
//! injected, which makes the store suitable for exercising coalescing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{EntityId, EntityStore, ResourceType, StoreError};

type Table<E> = HashMap<ResourceType, HashMap<EntityId, E>>;

/// One recorded bulk fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCall {
	/// Requested type.
	pub kind: ResourceType,
	/// Requested ids, in request order.
	pub ids: Vec<EntityId>,
}

/// Two-tier in-memory store with call recording.
#[derive(Debug)]
pub struct MemoryStore<E> {
	cache: RwLock<Table<E>>,
	remote: RwLock<Table<E>>,
	failures: Mutex<HashMap<ResourceType, String>>,
	delays: Mutex<HashMap<ResourceType, Duration>>,
	calls: Mutex<Vec<FindCall>>,
}

impl<E> Default for MemoryStore<E> {
	fn default() -> Self {
		Self {
			cache: RwLock::new(HashMap::new()),
			remote: RwLock::new(HashMap::new()),
			failures: Mutex::new(HashMap::new()),
			delays: Mutex::new(HashMap::new()),
			calls: Mutex::new(Vec::new()),
		}
	}
}

impl<E: Clone> MemoryStore<E> {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Places an entity directly in the cache tier.
	pub fn insert_cached(&self, kind: impl Into<ResourceType>, id: impl Into<EntityId>, entity: E) {
		self.cache.write().entry(kind.into()).or_default().insert(id.into(), entity);
	}

	/// Places an entity in the remote tier, reachable only through `find`.
	pub fn insert_remote(&self, kind: impl Into<ResourceType>, id: impl Into<EntityId>, entity: E) {
		self.remote.write().entry(kind.into()).or_default().insert(id.into(), entity);
	}

	/// Drops everything from the cache tier.
	pub fn clear_cache(&self) {
		self.cache.write().clear();
	}

	/// Makes every subsequent `find` for `kind` fail with `message`.
	pub fn fail_type(&self, kind: impl Into<ResourceType>, message: impl Into<String>) {
		self.failures.lock().insert(kind.into(), message.into());
	}

	/// Removes an injected failure.
	pub fn heal_type(&self, kind: impl Into<ResourceType>) {
		self.failures.lock().remove(&kind.into());
	}

	/// Delays every subsequent `find` for `kind` by `delay`.
	pub fn delay_type(&self, kind: impl Into<ResourceType>, delay: Duration) {
		self.delays.lock().insert(kind.into(), delay);
	}

	/// Returns every recorded `find`, oldest first.
	pub fn find_calls(&self) -> Vec<FindCall> {
		self.calls.lock().clone()
	}

	/// Returns the recorded `find`s for one type.
	pub fn find_calls_for(&self, kind: impl Into<ResourceType>) -> Vec<FindCall> {
		let kind = kind.into();
		self.calls.lock().iter().filter(|call| call.kind == kind).cloned().collect()
	}
}

#[async_trait]
impl<E> EntityStore for MemoryStore<E>
where
	E: Clone + Send + Sync + 'static,
{
	type Entity = E;

	fn get_by_id(&self, kind: &ResourceType, id: &EntityId) -> Option<E> {
		self.cache.read().get(kind)?.get(id).cloned()
	}

	async fn find(&self, kind: &ResourceType, ids: &[EntityId]) -> Result<Vec<E>, StoreError> {
		self.calls.lock().push(FindCall {
			kind: kind.clone(),
			ids: ids.to_vec(),
		});

		let delay = self.delays.lock().get(kind).copied();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		let failure = self.failures.lock().get(kind).cloned();
		if let Some(message) = failure {
			return Err(StoreError::Backend {
				kind: kind.clone(),
				message,
			});
		}

		let found: Vec<(EntityId, E)> = {
			let remote = self.remote.read();
			let Some(table) = remote.get(kind) else {
				return Ok(Vec::new());
			};
			ids.iter()
				.filter_map(|id| table.get(id).map(|entity| (id.clone(), entity.clone())))
				.collect()
		};

		let mut cache = self.cache.write();
		let cached = cache.entry(kind.clone()).or_default();
		Ok(found
			.into_iter()
			.map(|(id, entity)| {
				cached.insert(id, entity.clone());
				entity
			})
			.collect())
	}
}
