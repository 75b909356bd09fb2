//! Per-lookup error types.

use std::sync::Arc;

use thiserror::Error;

use crate::{EntityId, ResourceType, StoreError};

/// Outcome delivered to a [`crate::ResultHandle`].
///
/// `Ok(None)` is the absence marker: the bulk fetch completed but the store
/// has no entity for the id.
pub type Resolution<E> = Result<Option<E>, LookupError>;

/// Why a lookup did not produce an entity or an absence marker.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
	/// The bulk fetch for the lookup's type failed. Every lookup batched into
	/// that fetch shares the same underlying error.
	#[error("bulk fetch for `{kind}` failed: {source}")]
	Fetch {
		/// Resource type of the failed fetch.
		kind: ResourceType,
		/// Store failure.
		source: Arc<StoreError>,
	},

	/// The finder was dropped before the lookup could resolve.
	#[error("lookup for `{kind}` {id} dropped before resolving")]
	Dropped {
		/// Requested resource type.
		kind: ResourceType,
		/// Requested id.
		id: EntityId,
	},
}

impl LookupError {
	/// Returns the store error behind a failed fetch.
	pub fn store_error(&self) -> Option<&StoreError> {
		match self {
			Self::Fetch { source, .. } => Some(&**source),
			Self::Dropped { .. } => None,
		}
	}
}
