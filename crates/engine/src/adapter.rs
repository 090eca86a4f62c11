//! Control surface every concrete overlay technology exposes to the coordinator.

/// Imperative control handle for one mounted overlay.
///
/// Both calls are fire-and-forget and must be safe to repeat when the overlay
/// is already in the requested visual state. Adapters report progress back
/// through [`crate::SheetEventHandlers`]:
///
/// - `handle_opened` once fully visible,
/// - `handle_closed` once fully hidden after a close animation,
/// - `handle_dismiss` whenever the user, not the coordinator, starts a dismissal.
pub trait OverlayAdapter: Send + Sync {
	/// Short name used in diagnostics.
	fn name(&self) -> &'static str;

	/// Starts presenting the overlay.
	fn expand(&self);

	/// Starts hiding the overlay.
	fn close(&self);
}
