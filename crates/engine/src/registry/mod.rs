//! Per-overlay lookup tables that live beside the stack store.
//!
//! These maps are keyed by the same ids as the store but have their own
//! cleanup timing: entries go away when the rendering layer unmounts an
//! overlay, not when its logical record disappears, so a close animation that
//! is still in flight can keep driving its progress value.

use std::sync::Arc;

mod handles;
mod portal;
mod progress;

pub use handles::HandleRegistry;
pub use portal::{PortalSessions, portal_channel};
pub use progress::{PROGRESS_HIDDEN, PROGRESS_VISIBLE, ProgressRegistry, ProgressValue};

/// The three registries owned by one overlay stack.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
	pub handles: HandleRegistry,
	pub progress: ProgressRegistry,
	/// Shared with the stack store, which advances sessions on open.
	pub portals: Arc<PortalSessions>,
}

impl OverlayRegistry {
	pub fn new() -> Self {
		Self::default()
	}
}
