use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::adapter::OverlayAdapter;
use crate::ids::OverlayId;

/// `id -> control handle`, written by whoever mounts an adapter.
#[derive(Default)]
pub struct HandleRegistry {
	inner: RwLock<FxHashMap<OverlayId, Arc<dyn OverlayAdapter>>>,
}

impl HandleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs `handle`, returning the handle it replaced.
	pub fn insert(&self, id: OverlayId, handle: Arc<dyn OverlayAdapter>) -> Option<Arc<dyn OverlayAdapter>> {
		self.inner.write().insert(id, handle)
	}

	pub fn remove(&self, id: &OverlayId) -> Option<Arc<dyn OverlayAdapter>> {
		self.inner.write().remove(id)
	}

	pub fn get(&self, id: &OverlayId) -> Option<Arc<dyn OverlayAdapter>> {
		self.inner.read().get(id).cloned()
	}

	pub fn contains(&self, id: &OverlayId) -> bool {
		self.inner.read().contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}

impl fmt::Debug for HandleRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let guard = self.inner.read();
		let mut ids: Vec<_> = guard.iter().map(|(id, handle)| (id.as_str(), handle.name())).collect();
		ids.sort_unstable();
		f.debug_struct("HandleRegistry").field("handles", &ids).finish()
	}
}
