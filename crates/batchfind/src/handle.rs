use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::{EntityId, LookupError, ResourceType, Resolution};

/// Eventually-resolved lookup result.
///
/// The requested `(kind, id)` is known immediately; the entity arrives when
/// the handle is awaited (or observed with [`Self::try_resolve`]) after the
/// tick that serves it.
#[must_use = "dropping a lookup handle discards its result"]
pub struct ResultHandle<E> {
	kind: ResourceType,
	id: EntityId,
	rx: oneshot::Receiver<Resolution<E>>,
	settled: Option<Resolution<E>>,
}

// Never pin-projected.
impl<E> Unpin for ResultHandle<E> {}

impl<E> std::fmt::Debug for ResultHandle<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResultHandle")
			.field("kind", &self.kind)
			.field("id", &self.id)
			.field("settled", &self.settled.is_some())
			.finish()
	}
}

impl<E> ResultHandle<E> {
	/// Creates an unresolved handle and the completion that settles it.
	pub(crate) fn pending(kind: ResourceType, id: EntityId) -> (Self, Completion<E>) {
		let (tx, rx) = oneshot::channel();
		let handle = Self {
			kind,
			id,
			rx,
			settled: None,
		};
		(handle, Completion { tx })
	}

	/// Returns the requested resource type.
	pub fn kind(&self) -> &ResourceType {
		&self.kind
	}

	/// Returns the requested id.
	pub fn id(&self) -> &EntityId {
		&self.id
	}

	/// Returns the resolution if it has arrived, without waiting.
	pub fn try_resolve(&mut self) -> Option<&Resolution<E>> {
		if self.settled.is_none() {
			match self.rx.try_recv() {
				Ok(resolution) => self.settled = Some(resolution),
				Err(TryRecvError::Empty) => return None,
				Err(TryRecvError::Closed) => self.settled = Some(Err(self.dropped())),
			}
		}
		self.settled.as_ref()
	}

	/// Returns true once a resolution is available.
	pub fn is_settled(&mut self) -> bool {
		self.try_resolve().is_some()
	}

	fn dropped(&self) -> LookupError {
		LookupError::Dropped {
			kind: self.kind.clone(),
			id: self.id.clone(),
		}
	}
}

impl<E> Future for ResultHandle<E> {
	type Output = Resolution<E>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		if let Some(resolution) = this.settled.take() {
			return Poll::Ready(resolution);
		}
		match Pin::new(&mut this.rx).poll(cx) {
			Poll::Ready(Ok(resolution)) => Poll::Ready(resolution),
			Poll::Ready(Err(_)) => Poll::Ready(Err(this.dropped())),
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Write side of a [`ResultHandle`]; consumed by the first resolution.
pub(crate) struct Completion<E> {
	tx: oneshot::Sender<Resolution<E>>,
}

impl<E> Completion<E> {
	pub(crate) fn resolve(self, resolution: Resolution<E>) {
		if self.tx.send(resolution).is_err() {
			tracing::trace!("batch.resolve.receiver_dropped");
		}
	}
}
