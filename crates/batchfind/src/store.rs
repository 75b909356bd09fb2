use async_trait::async_trait;
use thiserror::Error;

use crate::{EntityId, ResourceType};

/// Backing entity store consulted by [`crate::BatchFinder`].
///
/// The store owns caching, transport and materialisation; the finder only
/// decides when to call it and with which ids.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
	/// Entity value handed to every waiting lookup. Cloned once per handle,
	/// so stores typically use an `Arc` or other cheap-to-clone record.
	type Entity: Clone + Send + Sync + 'static;

	/// Synchronous cache-only lookup. Must not block.
	fn get_by_id(&self, kind: &ResourceType, id: &EntityId) -> Option<Self::Entity>;

	/// Fetches many ids of one type, populating the cache as a side effect.
	///
	/// Completes once every id has been attempted; ids the backend does not
	/// know are simply absent from the result. An `Err` means the fetch as a
	/// whole failed.
	async fn find(&self, kind: &ResourceType, ids: &[EntityId]) -> Result<Vec<Self::Entity>, StoreError>;
}

/// Failure of a bulk fetch as a whole.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The store cannot serve requests at all.
	#[error("store unavailable: {0}")]
	Unavailable(String),

	/// The backend rejected or failed the request.
	#[error("fetching `{kind}` failed: {message}")]
	Backend {
		/// Resource type being fetched.
		kind: ResourceType,
		/// Backend-provided description.
		message: String,
	},

	/// The fetch task panicked.
	#[error("bulk fetch panicked: {0}")]
	Panicked(String),
}
