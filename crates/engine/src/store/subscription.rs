use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::state::StackState;

/// Receives every committed state.
pub(crate) trait StoreListener: Send + Sync {
	fn notify(&self, state: &StackState);
}

type ListenerSlot = (u64, Arc<dyn StoreListener>);

/// Registration list shared between the store and its subscription guards.
#[derive(Default)]
pub(crate) struct Listeners {
	slots: Mutex<Vec<ListenerSlot>>,
	next_key: AtomicU64,
}

impl Listeners {
	pub(crate) fn add(self: &Arc<Self>, listener: Arc<dyn StoreListener>) -> Subscription {
		let key = self.next_key.fetch_add(1, Ordering::Relaxed);
		self.slots.lock().push((key, listener));
		Subscription {
			key,
			listeners: Arc::downgrade(self),
		}
	}

	/// Registration-ordered copy, so callbacks run without the list locked.
	pub(crate) fn snapshot(&self) -> Vec<Arc<dyn StoreListener>> {
		self.slots.lock().iter().map(|(_, l)| Arc::clone(l)).collect()
	}

	pub(crate) fn len(&self) -> usize {
		self.slots.lock().len()
	}

	fn remove(&self, key: u64) {
		self.slots.lock().retain(|(k, _)| *k != key);
	}
}

/// RAII guard for a store subscription; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	key: u64,
	listeners: Weak<Listeners>,
}

impl Subscription {
	/// Keeps the listener registered for the lifetime of the store.
	pub fn detach(self) {
		std::mem::forget(self);
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").field("key", &self.key).finish()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(listeners) = self.listeners.upgrade() {
			listeners.remove(self.key);
		}
	}
}

/// Projects each state through `selector` and calls back when `eq` says the
/// projection changed. The callback receives `(current, previous)`.
pub(crate) struct SelectorListener<T, S, E, F> {
	pub(crate) selector: S,
	pub(crate) eq: E,
	pub(crate) callback: F,
	pub(crate) last: Mutex<T>,
}

impl<T, S, E, F> StoreListener for SelectorListener<T, S, E, F>
where
	T: Clone + Send,
	S: Fn(&StackState) -> T + Send + Sync,
	E: Fn(&T, &T) -> bool + Send + Sync,
	F: Fn(&T, &T) + Send + Sync,
{
	fn notify(&self, state: &StackState) {
		let next = (self.selector)(state);
		let previous = {
			let mut last = self.last.lock();
			if (self.eq)(&last, &next) {
				return;
			}
			std::mem::replace(&mut *last, next.clone())
		};
		(self.callback)(&next, &previous);
	}
}
