//! Pending lookup queues keyed by `(type, id)`.

use indexmap::IndexMap;

use crate::handle::Completion;
use crate::{EntityId, ResourceType};

/// Completions waiting on one id, in enqueue order.
pub(crate) type Waiters<E> = IndexMap<EntityId, Vec<Completion<E>>>;

/// Two-level insertion-ordered queue: type → id → completions.
pub(crate) struct TaskQueues<E> {
	by_type: IndexMap<ResourceType, Waiters<E>>,
	/// Total queued completions across all ids.
	len: usize,
}

/// Everything queued for one type at drain time.
pub(crate) struct TypeBatch<E> {
	pub kind: ResourceType,
	pub waiters: Waiters<E>,
}

impl<E> TypeBatch<E> {
	/// Distinct ids, in first-request order.
	pub fn ids(&self) -> Vec<EntityId> {
		self.waiters.keys().cloned().collect()
	}

	/// Number of completions in the batch.
	pub fn completions(&self) -> usize {
		self.waiters.values().map(Vec::len).sum()
	}
}

impl<E> Default for TaskQueues<E> {
	fn default() -> Self {
		Self {
			by_type: IndexMap::new(),
			len: 0,
		}
	}
}

impl<E> TaskQueues<E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a completion for `(kind, id)`, creating entries as needed.
	pub fn push(&mut self, kind: ResourceType, id: EntityId, completion: Completion<E>) {
		self.by_type.entry(kind).or_default().entry(id).or_default().push(completion);
		self.len += 1;
	}

	/// Total queued completions.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Number of distinct ids queued for `kind`.
	pub fn ids_for(&self, kind: &ResourceType) -> usize {
		self.by_type.get(kind).map_or(0, IndexMap::len)
	}

	/// Removes and returns every queued type, leaving the queues empty.
	pub fn drain(&mut self) -> Vec<TypeBatch<E>> {
		self.len = 0;
		std::mem::take(&mut self.by_type)
			.into_iter()
			.filter(|(_, waiters)| !waiters.is_empty())
			.map(|(kind, waiters)| TypeBatch { kind, waiters })
			.collect()
	}
}
