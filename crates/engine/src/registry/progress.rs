use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::watch;

use crate::ids::OverlayId;

/// Progress of a fully hidden overlay.
pub const PROGRESS_HIDDEN: f32 = -1.0;

/// Progress of a fully presented overlay.
pub const PROGRESS_VISIBLE: f32 = 0.0;

/// Continuously observable visibility of one overlay, `-1` hidden to `0` visible.
///
/// Clones share the same value. Continuous-gesture adapters may drive it
/// through every intermediate value during a drag.
#[derive(Debug, Clone)]
pub struct ProgressValue {
	tx: Arc<watch::Sender<f32>>,
}

impl Default for ProgressValue {
	fn default() -> Self {
		Self::new(PROGRESS_HIDDEN)
	}
}

impl ProgressValue {
	pub fn new(initial: f32) -> Self {
		Self {
			tx: Arc::new(watch::Sender::new(initial)),
		}
	}

	pub fn get(&self) -> f32 {
		*self.tx.borrow()
	}

	/// Stores `value`, notifying observers only when it differs.
	pub fn set(&self, value: f32) {
		self.tx.send_if_modified(|current| {
			if *current == value {
				return false;
			}
			*current = value;
			true
		});
	}

	/// Receiver notified on every change.
	pub fn subscribe(&self) -> watch::Receiver<f32> {
		self.tx.subscribe()
	}

	pub fn is_visible(&self) -> bool {
		self.get() >= PROGRESS_VISIBLE
	}
}

/// `id -> progress value`, created lazily on first access.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
	inner: Mutex<FxHashMap<OverlayId, ProgressValue>>,
}

impl ProgressRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the value for `id`, creating it hidden when absent.
	pub fn get_or_create(&self, id: &OverlayId) -> ProgressValue {
		self.inner.lock().entry(id.clone()).or_default().clone()
	}

	pub fn get(&self, id: &OverlayId) -> Option<ProgressValue> {
		self.inner.lock().get(id).cloned()
	}

	/// Drops the entry so the map does not grow across the app's lifetime.
	///
	/// Clones held by consumers keep working; they are just no longer reachable by id.
	pub fn remove(&self, id: &OverlayId) -> Option<ProgressValue> {
		self.inner.lock().remove(id)
	}

	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().is_empty()
	}
}
