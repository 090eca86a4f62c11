//! Single source of truth for overlay records and stack order.
//!
//! Every mutation goes through a named action that applies one pure
//! transition under the store lock and commits the result as a new snapshot.
//! Observers are notified after the lock is released.
//!
//! # Invariants
//!
//! - Listeners observe committed states in commit order and never see an older
//!   state after a newer one.
//! - A commit made from inside a listener (an adapter reporting `opened`
//!   synchronously from `expand`, say) is folded into the notification pass
//!   already running instead of recursing.
//! - Actions that change nothing neither bump the version nor notify.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::ids::{GroupId, OverlayId};
use crate::record::{OpenEntry, OpenMode, OverlayRecord, OverlayStatus, Params};
use crate::registry::PortalSessions;
use crate::state::StackState;
use crate::transitions;

mod subscription;

pub use subscription::Subscription;
use subscription::{Listeners, SelectorListener, StoreListener};

struct StoreInner {
	state: Arc<StackState>,
	version: u64,
	notifying: bool,
}

/// Process-wide overlay state, shared by the coordinator and UI consumers.
pub struct StackStore {
	inner: Mutex<StoreInner>,
	listeners: Arc<Listeners>,
	version_tx: watch::Sender<u64>,
	portals: Arc<PortalSessions>,
}

impl Default for StackStore {
	fn default() -> Self {
		Self::new(Arc::default())
	}
}

impl std::fmt::Debug for StackStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("StackStore")
			.field("version", &inner.version)
			.field("state", &inner.state)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

/// Resets the notifying flag if a listener panics mid-pass.
struct NotifyPass<'a> {
	inner: &'a Mutex<StoreInner>,
	finished: bool,
}

impl Drop for NotifyPass<'_> {
	fn drop(&mut self) {
		if !self.finished {
			self.inner.lock().notifying = false;
		}
	}
}

impl StackStore {
	/// Creates an empty store drawing portal sessions from `portals`.
	pub fn new(portals: Arc<PortalSessions>) -> Self {
		Self {
			inner: Mutex::new(StoreInner {
				state: Arc::default(),
				version: 0,
				notifying: false,
			}),
			listeners: Arc::default(),
			version_tx: watch::Sender::new(0),
			portals,
		}
	}

	pub fn snapshot(&self) -> Arc<StackState> {
		Arc::clone(&self.inner.lock().state)
	}

	/// Number of committed changes so far.
	pub fn version(&self) -> u64 {
		self.inner.lock().version
	}

	pub fn record(&self, id: &OverlayId) -> Option<OverlayRecord> {
		self.inner.lock().state.record(id).cloned()
	}

	pub fn status(&self, id: &OverlayId) -> Option<OverlayStatus> {
		self.inner.lock().state.status(id)
	}

	pub fn contains(&self, id: &OverlayId) -> bool {
		self.inner.lock().state.contains(id)
	}

	/// Stack order of `group`, bottom to top.
	pub fn group_order(&self, group: &GroupId) -> Vec<OverlayId> {
		self.inner.lock().state.group_order(group).cloned().collect()
	}

	pub fn top_of_group(&self, group: &GroupId) -> Option<OverlayRecord> {
		self.inner.lock().state.top_of_group(group).cloned()
	}

	pub fn is_active(&self, id: &OverlayId) -> bool {
		self.status(id).is_some_and(OverlayStatus::is_active)
	}

	/// Opens `entry` according to `mode`. Returns false when the id is already
	/// tracked and not a dormant kept-mounted overlay.
	pub fn open(&self, entry: OpenEntry, mode: OpenMode) -> bool {
		let id = entry.id.clone();
		let group = entry.group.clone();
		let portals = Arc::clone(&self.portals);
		let changed = self.apply(|state| transitions::open(state, entry, mode, |id| portals.next(id)));
		trace!(id = %id, group = %group, ?mode, changed, "overlay.open");
		changed
	}

	pub fn mark_open(&self, id: &OverlayId) -> bool {
		let changed = self.apply(|state| transitions::mark_open(state, id));
		trace!(id = %id, changed, "overlay.mark_open");
		changed
	}

	pub fn start_closing(&self, id: &OverlayId) -> bool {
		let changed = self.apply(|state| transitions::start_closing(state, id));
		trace!(id = %id, changed, "overlay.start_closing");
		changed
	}

	/// `start_closing`, but only while `id` still names the same `instance`.
	pub fn start_closing_instance(&self, id: &OverlayId, instance: u64) -> bool {
		let changed = self.apply(|state| state.instance(id) == Some(instance) && transitions::start_closing(state, id));
		trace!(id = %id, instance, changed, "overlay.start_closing_instance");
		changed
	}

	pub fn finish_closing(&self, id: &OverlayId) -> bool {
		let changed = self.apply(|state| transitions::finish_closing(state, id));
		trace!(id = %id, changed, "overlay.finish_closing");
		changed
	}

	pub fn update_params(&self, id: &OverlayId, params: Params) -> bool {
		self.apply(|state| transitions::update_params(state, id, Some(params)))
	}

	pub fn reset_params(&self, id: &OverlayId) -> bool {
		self.apply(|state| transitions::update_params(state, id, None))
	}

	pub fn set_prevent_dismiss(&self, id: &OverlayId, prevent: bool) -> bool {
		self.apply(|state| transitions::set_prevent_dismiss(state, id, prevent))
	}

	pub fn clear_group(&self, group: &GroupId) -> bool {
		let changed = self.apply(|state| transitions::clear_group(state, group));
		trace!(group = %group, changed, "overlay.clear_group");
		changed
	}

	pub fn clear_all(&self) -> bool {
		let changed = self.apply(transitions::clear_all);
		trace!(changed, "overlay.clear_all");
		changed
	}

	pub fn mount(&self, entry: OpenEntry) -> bool {
		let id = entry.id.clone();
		let changed = self.apply(|state| transitions::mount(state, entry));
		trace!(id = %id, changed, "overlay.mount");
		changed
	}

	pub fn unmount(&self, id: &OverlayId) -> bool {
		let changed = self.apply(|state| transitions::unmount(state, id));
		trace!(id = %id, changed, "overlay.unmount");
		changed
	}

	/// Subscribes to every committed state.
	pub fn subscribe(&self, callback: impl Fn(&StackState) + Send + Sync + 'static) -> Subscription {
		struct Plain<F>(F);
		impl<F: Fn(&StackState) + Send + Sync> StoreListener for Plain<F> {
			fn notify(&self, state: &StackState) {
				(self.0)(state)
			}
		}
		self.listeners.add(Arc::new(Plain(callback)))
	}

	/// Subscribes to a projection of the state.
	///
	/// `callback(current, previous)` runs only when `eq` reports the projection
	/// changed. The projection of the state at subscribe time is the baseline;
	/// it is not delivered.
	pub fn subscribe_with_selector<T, S, E, F>(&self, selector: S, eq: E, callback: F) -> Subscription
	where
		T: Clone + Send + 'static,
		S: Fn(&StackState) -> T + Send + Sync + 'static,
		E: Fn(&T, &T) -> bool + Send + Sync + 'static,
		F: Fn(&T, &T) + Send + Sync + 'static,
	{
		let baseline = selector(&self.snapshot());
		self.listeners.add(Arc::new(SelectorListener {
			selector,
			eq,
			callback,
			last: Mutex::new(baseline),
		}))
	}

	/// Resolves once `predicate` holds for the current state.
	pub async fn wait_until(&self, predicate: impl Fn(&StackState) -> bool) {
		let mut rx = self.version_tx.subscribe();
		loop {
			rx.mark_unchanged();
			if predicate(&self.snapshot()) {
				return;
			}
			if rx.changed().await.is_err() {
				return;
			}
		}
	}

	/// Like [`Self::wait_until`] but gives up after `timeout`, returning false.
	pub async fn wait_until_timeout(&self, predicate: impl Fn(&StackState) -> bool, timeout: Duration) -> bool {
		tokio::time::timeout(timeout, self.wait_until(predicate)).await.is_ok()
	}

	fn apply(&self, transition: impl FnOnce(&mut StackState) -> bool) -> bool {
		let start_pass = {
			let mut inner = self.inner.lock();
			if !transition(Arc::make_mut(&mut inner.state)) {
				return false;
			}
			inner.version += 1;
			self.version_tx.send_replace(inner.version);
			!std::mem::replace(&mut inner.notifying, true)
		};
		if start_pass {
			self.notify_pass();
		}
		true
	}

	/// Delivers committed states to listeners until no commit is outstanding.
	fn notify_pass(&self) {
		let mut pass = NotifyPass {
			inner: &self.inner,
			finished: false,
		};
		loop {
			let (state, version) = {
				let inner = self.inner.lock();
				(Arc::clone(&inner.state), inner.version)
			};
			for listener in self.listeners.snapshot() {
				listener.notify(&state);
			}
			let mut inner = self.inner.lock();
			if inner.version == version {
				inner.notifying = false;
				pass.finished = true;
				return;
			}
		}
	}
}
