//! Timer-driven bottom sheet.
//!
//! The sheet animates its progress value between [`PROGRESS_HIDDEN`] and
//! [`PROGRESS_VISIBLE`] on the tokio timer and reports `opened`/`closed` when an
//! animation runs to completion. A new command aborts the animation in flight
//! and continues from the current progress, so an interrupted open never
//! reports `opened`.
//!
//! Drags drive the progress value directly; [`AnimatedSheetAdapter::release`]
//! either dismisses through the interceptor or springs back.

use std::time::Duration;

use overstack_engine::{CloseOutcome, OverlayAdapter, PROGRESS_HIDDEN, PROGRESS_VISIBLE, ProgressValue, SheetEventHandlers};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::AdapterError;

/// Progress below which a released drag dismisses the sheet.
pub const DISMISS_THRESHOLD: f32 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetAnimationConfig {
	pub open_ms: u64,
	pub close_ms: u64,
	/// Interval between progress updates.
	pub frame_ms: u64,
}

impl Default for SheetAnimationConfig {
	fn default() -> Self {
		Self {
			open_ms: 250,
			close_ms: 200,
			frame_ms: 16,
		}
	}
}

impl SheetAnimationConfig {
	pub fn validate(&self) -> Result<(), AdapterError> {
		if self.frame_ms == 0 {
			return Err(AdapterError::InvalidAnimation("frame_ms must be positive".to_string()));
		}
		for (field, ms) in [("open_ms", self.open_ms), ("close_ms", self.close_ms)] {
			if u32::try_from(ms.div_ceil(self.frame_ms)).is_err() {
				return Err(AdapterError::InvalidAnimation(format!("{field} spans more than {} frames", u32::MAX)));
			}
		}
		Ok(())
	}

	fn duration(&self, target: f32) -> Duration {
		if target == PROGRESS_VISIBLE {
			Duration::from_millis(self.open_ms)
		} else {
			Duration::from_millis(self.close_ms)
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
	Opened,
	Closed,
	Nothing,
}

#[derive(Debug)]
pub struct AnimatedSheetAdapter {
	events: SheetEventHandlers,
	config: SheetAnimationConfig,
	runtime: Option<Handle>,
	animation: Mutex<Option<JoinHandle<()>>>,
}

impl AnimatedSheetAdapter {
	/// Builds a sheet animating on the current tokio runtime.
	///
	/// Outside a runtime the sheet still works, jumping straight to the end of
	/// every animation.
	pub fn new(events: SheetEventHandlers, config: SheetAnimationConfig) -> Result<Self, AdapterError> {
		config.validate()?;
		Ok(Self {
			events,
			config,
			runtime: Handle::try_current().ok(),
			animation: Mutex::new(None),
		})
	}

	pub fn events(&self) -> &SheetEventHandlers {
		&self.events
	}

	pub fn progress(&self) -> ProgressValue {
		self.events.progress()
	}

	pub fn is_animating(&self) -> bool {
		self.animation.lock().as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Follows the user's finger. `progress` is clamped to the visible range.
	pub fn drag(&self, progress: f32) {
		self.cancel_animation();
		self.progress().set(progress.clamp(PROGRESS_HIDDEN, PROGRESS_VISIBLE));
	}

	/// Ends a drag: dismisses past [`DISMISS_THRESHOLD`], otherwise springs back.
	///
	/// A dismissal refused by the interceptor, or suppressed by
	/// `prevent_dismiss`, also springs back.
	pub async fn release(&self) -> CloseOutcome {
		let progress = self.progress().get();
		let outcome = if progress > DISMISS_THRESHOLD {
			CloseOutcome::Ignored
		} else if self.events.prevent_dismiss() {
			trace!(id = %self.events.id(), "sheet.dismiss suppressed");
			CloseOutcome::Blocked
		} else {
			self.events.handle_dismiss().await
		};
		if outcome != CloseOutcome::Closed {
			self.animate(PROGRESS_VISIBLE, Report::Nothing);
		}
		outcome
	}

	fn cancel_animation(&self) {
		if let Some(task) = self.animation.lock().take() {
			task.abort();
		}
	}

	fn animate(&self, target: f32, report: Report) {
		let progress = self.progress();
		let from = progress.get();
		let duration = self.config.duration(target);
		let frame = Duration::from_millis(self.config.frame_ms);

		let mut animation = self.animation.lock();
		if let Some(task) = animation.take() {
			task.abort();
		}
		let Some(runtime) = self.runtime.as_ref().filter(|_| !duration.is_zero()) else {
			progress.set(target);
			drop(animation);
			finish(&self.events, report);
			return;
		};

		debug!(id = %self.events.id(), from, target, ?duration, "sheet.animate");
		let events = self.events.clone();
		*animation = Some(runtime.spawn(async move {
			let steps = u32::try_from(duration.as_millis().div_ceil(frame.as_millis()))
				.unwrap_or(u32::MAX)
				.max(1);
			for step in 1..=steps {
				tokio::time::sleep(frame.min(duration)).await;
				let t = step as f32 / steps as f32;
				progress.set(from + (target - from) * t);
			}
			progress.set(target);
			finish(&events, report);
		}));
	}
}

fn finish(events: &SheetEventHandlers, report: Report) {
	match report {
		Report::Opened => events.handle_opened(),
		Report::Closed => events.handle_closed(),
		Report::Nothing => {}
	}
}

impl OverlayAdapter for AnimatedSheetAdapter {
	fn name(&self) -> &'static str {
		"animated-sheet"
	}

	fn expand(&self) {
		self.animate(PROGRESS_VISIBLE, Report::Opened);
	}

	fn close(&self) {
		self.animate(PROGRESS_HIDDEN, Report::Closed);
	}
}

impl Drop for AnimatedSheetAdapter {
	fn drop(&mut self) {
		self.cancel_animation();
	}
}
