use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ids::OverlayId;

/// Monotonic per-id portal session counters.
///
/// Counters outlive the records they were issued for, so every teleport
/// channel name ever used for an id stays unique. A slow-to-unmount channel
/// from an earlier instance can then never capture content meant for a newly
/// reopened instance of the same id.
#[derive(Debug, Default)]
pub struct PortalSessions {
	inner: Mutex<FxHashMap<OverlayId, u64>>,
}

impl PortalSessions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances and returns the session for `id`. The first session is 1.
	pub fn next(&self, id: &OverlayId) -> u64 {
		let mut guard = self.inner.lock();
		let session = guard.entry(id.clone()).or_insert(0);
		*session += 1;
		*session
	}

	/// Last issued session for `id`, or 0 when none was issued.
	pub fn current(&self, id: &OverlayId) -> u64 {
		self.inner.lock().get(id).copied().unwrap_or(0)
	}

	/// Forgets every counter.
	#[cfg(test)]
	pub(crate) fn reset(&self) {
		self.inner.lock().clear();
	}
}

/// Teleport channel name for one session of an overlay.
pub fn portal_channel(id: &OverlayId, session: u64) -> String {
	format!("overlay-portal:{id}:{session}")
}
