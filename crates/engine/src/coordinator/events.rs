use tokio::task::JoinHandle;
use tracing::trace;

use super::{CloseOutcome, Coordinator};
use crate::ids::OverlayId;
use crate::record::OverlayStatus;
use crate::registry::ProgressValue;

/// Callbacks an adapter uses to report lifecycle events for one overlay.
#[derive(Clone, Debug)]
pub struct SheetEventHandlers {
	id: OverlayId,
	coordinator: Coordinator,
}

impl SheetEventHandlers {
	pub(super) fn new(id: OverlayId, coordinator: Coordinator) -> Self {
		Self { id, coordinator }
	}

	pub fn id(&self) -> &OverlayId {
		&self.id
	}

	/// The overlay became fully visible.
	pub fn handle_opened(&self) {
		self.coordinator.store().mark_open(&self.id);
	}

	/// The overlay is fully hidden after a close animation.
	///
	/// Duplicate reports and reports for suspended overlays are ignored.
	pub fn handle_closed(&self) {
		match self.coordinator.store().status(&self.id) {
			None | Some(OverlayStatus::Hidden) => {
				trace!(id = %self.id, "handle_closed ignored");
			}
			Some(_) => {
				self.coordinator.store().finish_closing(&self.id);
			}
		}
	}

	/// The user started a dismissal (swipe, backdrop tap, back button).
	pub async fn handle_dismiss(&self) -> CloseOutcome {
		self.coordinator.request_close(&self.id).await
	}

	/// [`Self::handle_dismiss`] for synchronous adapter callbacks.
	///
	/// Must be called from within a tokio runtime.
	pub fn spawn_dismiss(&self) -> JoinHandle<CloseOutcome> {
		let handlers = self.clone();
		tokio::spawn(async move { handlers.handle_dismiss().await })
	}

	/// Whether gesture-driven dismissal should be suppressed right now.
	pub fn prevent_dismiss(&self) -> bool {
		self.coordinator.store().record(&self.id).is_some_and(|r| r.prevent_dismiss)
	}

	pub fn status(&self) -> Option<OverlayStatus> {
		self.coordinator.store().status(&self.id)
	}

	/// Progress value of this overlay, created on first access.
	pub fn progress(&self) -> ProgressValue {
		self.coordinator.registry().progress.get_or_create(&self.id)
	}
}
