//! Bridge between declarative stack state and imperative adapters.
//!
//! Downward, the coordinator watches each group's `(id, status)` tuples and
//! issues exactly one command per status change: `opening -> expand()`,
//! `closing | hidden -> close()`, `open ->` nothing. Upward,
//! [`SheetEventHandlers`] turn adapter reports back into store actions, and
//! [`Coordinator::request_close`] routes every "try to close" through the
//! before-close interceptor of the overlay.
//!
//! # Invariants
//!
//! - Unchanged ids never receive a redundant command.
//! - Changes within one snapshot are dispatched bottom to top in stack order.
//! - Ids without a registered handle are skipped; the batch still proceeds.
//! - Concurrent close requests for one overlay share a single interceptor
//!   decision.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::adapter::OverlayAdapter;
use crate::ids::{GroupId, OverlayId};
use crate::interceptor::{BeforeClose, InterceptorRegistry};
use crate::record::OverlayStatus;
use crate::registry::{HandleRegistry, OverlayRegistry};
use crate::store::{StackStore, Subscription};

mod cascade;
mod events;

pub use cascade::{CloseAllOptions, CloseAllOutcome};
pub use events::SheetEventHandlers;

/// Result of one close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
	/// The overlay is now `closing`.
	Closed,
	/// Its interceptor refused.
	Blocked,
	/// Absent, already closing, or hidden; nothing to do.
	Ignored,
}

type GroupStatuses = Vec<(OverlayId, OverlayStatus)>;

/// An overlay id plus the record instance a close decision was asked for.
type PendingKey = (OverlayId, u64);

struct CoordinatorInner {
	store: Arc<StackStore>,
	registry: Arc<OverlayRegistry>,
	interceptors: Arc<InterceptorRegistry>,
	groups: Mutex<FxHashMap<GroupId, Subscription>>,
	pending: Mutex<FxHashMap<PendingKey, watch::Receiver<Option<bool>>>>,
	close_ack_timeout: Duration,
}

/// Cheaply cloneable coordinator handle.
#[derive(Clone)]
pub struct Coordinator {
	inner: Arc<CoordinatorInner>,
}

impl std::fmt::Debug for Coordinator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut groups: Vec<_> = self.inner.groups.lock().keys().map(|g| g.to_string()).collect();
		groups.sort_unstable();
		f.debug_struct("Coordinator").field("groups", &groups).finish()
	}
}

impl Coordinator {
	pub fn new(
		store: Arc<StackStore>,
		registry: Arc<OverlayRegistry>,
		interceptors: Arc<InterceptorRegistry>,
		close_ack_timeout: Duration,
	) -> Self {
		Self {
			inner: Arc::new(CoordinatorInner {
				store,
				registry,
				interceptors,
				groups: Mutex::default(),
				pending: Mutex::default(),
				close_ack_timeout,
			}),
		}
	}

	pub fn store(&self) -> &Arc<StackStore> {
		&self.inner.store
	}

	pub fn registry(&self) -> &Arc<OverlayRegistry> {
		&self.inner.registry
	}

	pub fn interceptors(&self) -> &Arc<InterceptorRegistry> {
		&self.inner.interceptors
	}

	/// Starts driving adapters for `group`. Idempotent.
	pub fn attach(&self, group: &GroupId) {
		let mut groups = self.inner.groups.lock();
		if groups.contains_key(group) {
			return;
		}
		let selected = group.clone();
		let registry = Arc::clone(&self.inner.registry);
		let subscription = self.inner.store.subscribe_with_selector(
			move |state| state.group_statuses(&selected),
			|a: &GroupStatuses, b: &GroupStatuses| a == b,
			move |current, previous| dispatch(&registry.handles, previous, current),
		);
		debug!(group = %group, "coordinator.attach");
		groups.insert(group.clone(), subscription);
	}

	/// Stops driving adapters for `group`.
	pub fn detach(&self, group: &GroupId) -> bool {
		self.inner.groups.lock().remove(group).is_some()
	}

	pub fn is_attached(&self, group: &GroupId) -> bool {
		self.inner.groups.lock().contains_key(group)
	}

	/// Installs the control handle for `id` and brings it to the current status.
	///
	/// Adapters usually mount after the overlay was opened, so the `expand()`
	/// issued at `opening` would otherwise be lost.
	pub fn register_handle(&self, id: OverlayId, handle: Arc<dyn OverlayAdapter>) {
		let status = self.inner.store.status(&id);
		self.inner.registry.handles.insert(id.clone(), Arc::clone(&handle));
		if status.is_some_and(OverlayStatus::is_active) {
			debug!(id = %id, adapter = handle.name(), "coordinator.expand_on_mount");
			handle.expand();
		}
	}

	/// Removes the control handle and progress value once rendering unmounts.
	pub fn release_handle(&self, id: &OverlayId) {
		self.inner.registry.handles.remove(id);
		self.inner.registry.progress.remove(id);
	}

	/// Reverse channel for adapters of `id`.
	pub fn event_handlers(&self, id: impl Into<OverlayId>) -> SheetEventHandlers {
		SheetEventHandlers::new(id.into(), self.clone())
	}

	/// Closes `id` unless its interceptor refuses.
	///
	/// Suspends until the interceptor resolves; a request arriving while a
	/// decision for the same overlay instance is pending waits for that
	/// decision. A decision only ever closes the instance it was asked about:
	/// if the id was removed, or removed and opened again, in the meantime,
	/// the request is `Ignored`.
	pub async fn request_close(&self, id: &OverlayId) -> CloseOutcome {
		let Some(instance) = self.inner.store.record(id).filter(|r| r.status.is_active()).map(|r| r.instance) else {
			trace!(id = %id, "coordinator.request_close ignored");
			return CloseOutcome::Ignored;
		};
		let Some(interceptor) = self.inner.interceptors.get(id) else {
			return self.force_close(id);
		};
		if !self.decide(id, instance, interceptor).await {
			debug!(id = %id, instance, "coordinator.request_close blocked");
			return CloseOutcome::Blocked;
		}
		if self.inner.store.start_closing_instance(id, instance) {
			return CloseOutcome::Closed;
		}
		match self.inner.store.record(id).map(|r| r.instance) {
			Some(current) if current == instance => {
				debug!(id = %id, instance, "close decision resolved against an inactive overlay");
			}
			current => {
				warn!(id = %id, instance, ?current, "stale close decision; overlay instance is gone");
			}
		}
		CloseOutcome::Ignored
	}

	/// Starts closing `id` without consulting its interceptor.
	pub fn force_close(&self, id: &OverlayId) -> CloseOutcome {
		if self.inner.store.start_closing(id) {
			CloseOutcome::Closed
		} else {
			CloseOutcome::Ignored
		}
	}

	pub fn has_pending_decision(&self, id: &OverlayId) -> bool {
		self.inner.pending.lock().keys().any(|(pending, _)| pending == id)
	}

	async fn decide(&self, id: &OverlayId, instance: u64, interceptor: BeforeClose) -> bool {
		let key = (id.clone(), instance);
		let waiter = {
			let mut pending = self.inner.pending.lock();
			match pending.get(&key) {
				Some(rx) => Err(rx.clone()),
				None => {
					let (tx, rx) = watch::channel(None);
					pending.insert(key.clone(), rx);
					Ok(tx)
				}
			}
		};

		match waiter {
			Ok(tx) => {
				let _pending = PendingDecision { key, inner: &self.inner };
				let allow = interceptor.evaluate(id).await;
				let _ = tx.send(Some(allow));
				allow
			}
			Err(mut rx) => loop {
				if let Some(allow) = *rx.borrow_and_update() {
					return allow;
				}
				if rx.changed().await.is_err() {
					return false;
				}
			},
		}
	}
}

/// Clears the pending entry for an overlay instance however its evaluation ends.
struct PendingDecision<'a> {
	key: PendingKey,
	inner: &'a CoordinatorInner,
}

impl Drop for PendingDecision<'_> {
	fn drop(&mut self) {
		self.inner.pending.lock().remove(&self.key);
	}
}

/// Issues one adapter command per status that changed between snapshots.
pub(crate) fn dispatch(handles: &HandleRegistry, previous: &[(OverlayId, OverlayStatus)], current: &[(OverlayId, OverlayStatus)]) {
	for (id, status) in current {
		let before = previous.iter().find(|(p, _)| p == id).map(|(_, s)| *s);
		if before == Some(*status) {
			continue;
		}
		let Some(handle) = handles.get(id) else {
			trace!(id = %id, ?status, "coordinator.dispatch skipped: no handle");
			continue;
		};
		match status {
			OverlayStatus::Opening => {
				debug!(id = %id, adapter = handle.name(), "coordinator.expand");
				handle.expand();
			}
			OverlayStatus::Closing | OverlayStatus::Hidden => {
				debug!(id = %id, adapter = handle.name(), ?status, "coordinator.close");
				handle.close();
			}
			OverlayStatus::Open => {}
		}
	}
}
