//! Top-to-bottom close-all cascade.
//!
//! Each overlay's interceptor is awaited before the next overlay is touched, so
//! a blocking interceptor halts the cascade and leaves everything below it open.
//!
//! With a nonzero stagger the cascade also waits for the closed overlay to
//! leave the stack (its adapter's `handle_closed`) before sleeping the stagger
//! and moving on; the wait is bounded by the coordinator's close
//! acknowledgement timeout. With zero stagger, close commands are issued back
//! to back without waiting for animations.

use std::time::Duration;

use tracing::{debug, warn};

use super::{CloseOutcome, Coordinator};
use crate::ids::{GroupId, OverlayId};
use crate::record::OverlayStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseAllOptions {
	/// Delay between successive closes. `None` uses the configured default.
	pub stagger: Option<Duration>,
}

impl CloseAllOptions {
	pub fn stagger(delay: Duration) -> Self {
		Self { stagger: Some(delay) }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseAllOutcome {
	/// Every overlay that could be closed was closed, top first.
	Completed { closed: Vec<OverlayId> },
	/// An interceptor blocked at `at`; overlays below it were left untouched.
	Halted { closed: Vec<OverlayId>, at: OverlayId },
}

impl CloseAllOutcome {
	pub fn closed(&self) -> &[OverlayId] {
		match self {
			Self::Completed { closed } | Self::Halted { closed, .. } => closed,
		}
	}

	pub fn is_completed(&self) -> bool {
		matches!(self, Self::Completed { .. })
	}
}

impl Coordinator {
	/// Closes every overlay of `group`, top to bottom, honoring interceptors.
	pub async fn close_all(&self, group: &GroupId, stagger: Duration) -> CloseAllOutcome {
		let mut ids = self.store().group_order(group);
		ids.reverse();
		debug!(group = %group, count = ids.len(), ?stagger, "coordinator.close_all");

		let mut closed = Vec::new();
		for id in ids {
			if !closed.is_empty() && !stagger.is_zero() {
				tokio::time::sleep(stagger).await;
			}
			match self.request_close(&id).await {
				CloseOutcome::Closed => {
					if !stagger.is_zero() {
						self.await_close_ack(&id).await;
					}
					closed.push(id);
				}
				CloseOutcome::Blocked => {
					debug!(group = %group, at = %id, "coordinator.close_all halted");
					return CloseAllOutcome::Halted { closed, at: id };
				}
				CloseOutcome::Ignored => {}
			}
		}
		CloseAllOutcome::Completed { closed }
	}

	async fn await_close_ack(&self, id: &OverlayId) {
		let acknowledged = self
			.store()
			.wait_until_timeout(
				|state| !state.in_stack(id) || state.status(id) == Some(OverlayStatus::Hidden),
				self.inner.close_ack_timeout,
			)
			.await;
		if !acknowledged {
			warn!(id = %id, timeout = ?self.inner.close_ack_timeout, "close not acknowledged; continuing cascade");
		}
	}
}
