//! Unanimated modal adapter.

use overstack_engine::{CloseOutcome, OverlayAdapter, PROGRESS_HIDDEN, PROGRESS_VISIBLE, SheetEventHandlers};
use tracing::trace;

/// Ways a user can ask to dismiss an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DismissGesture {
	Swipe,
	BackdropTap,
	/// Hardware or navigation back.
	BackButton,
}

impl DismissGesture {
	/// Native gestures are suppressed outright while dismissal is prevented.
	/// Back navigation still goes through the interceptor.
	pub const fn is_gesture(self) -> bool {
		matches!(self, Self::Swipe | Self::BackdropTap)
	}
}

/// Shows and hides instantly, reporting `opened`/`closed` synchronously.
#[derive(Debug)]
pub struct ModalAdapter {
	events: SheetEventHandlers,
}

impl ModalAdapter {
	pub fn new(events: SheetEventHandlers) -> Self {
		Self { events }
	}

	pub fn events(&self) -> &SheetEventHandlers {
		&self.events
	}

	/// Routes a user dismissal into the stack.
	pub async fn user_dismiss(&self, gesture: DismissGesture) -> CloseOutcome {
		if gesture.is_gesture() && self.events.prevent_dismiss() {
			trace!(id = %self.events.id(), ?gesture, "modal.dismiss suppressed");
			return CloseOutcome::Blocked;
		}
		self.events.handle_dismiss().await
	}
}

impl OverlayAdapter for ModalAdapter {
	fn name(&self) -> &'static str {
		"modal"
	}

	fn expand(&self) {
		self.events.progress().set(PROGRESS_VISIBLE);
		self.events.handle_opened();
	}

	fn close(&self) {
		self.events.progress().set(PROGRESS_HIDDEN);
		self.events.handle_closed();
	}
}
