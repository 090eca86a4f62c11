//! Adapter over an optional third-party sheet implementation.
//!
//! Backends are installed into a [`BackendCatalog`] by whichever part of the
//! application links the library. [`LibrarySheetAdapter::new`] resolves its
//! backend at construction and fails with [`AdapterError::MissingDependency`]
//! when it was never installed, so applications that never build this adapter
//! do not need the library at all.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use overstack_engine::{CloseOutcome, OverlayAdapter, OverlayId, PROGRESS_HIDDEN, PROGRESS_VISIBLE, SheetEventHandlers};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::AdapterError;

/// Imperative surface of an external sheet library.
///
/// The library reports back through [`LibrarySheetAdapter::library_presented`]
/// and [`LibrarySheetAdapter::library_dismissed`].
pub trait SheetBackend: Send + Sync {
	fn present(&self, id: &OverlayId);

	/// Must be a no-op when the sheet is already dismissed.
	fn dismiss(&self, id: &OverlayId);
}

/// Installed sheet backends, by name.
#[derive(Default)]
pub struct BackendCatalog {
	backends: RwLock<FxHashMap<String, Arc<dyn SheetBackend>>>,
}

impl fmt::Debug for BackendCatalog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let guard = self.backends.read();
		let mut names: Vec<_> = guard.keys().map(String::as_str).collect();
		names.sort_unstable();
		f.debug_struct("BackendCatalog").field("backends", &names).finish()
	}
}

impl BackendCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn install(&self, name: impl Into<String>, backend: Arc<dyn SheetBackend>) {
		self.backends.write().insert(name.into(), backend);
	}

	pub fn resolve(&self, name: &str) -> Option<Arc<dyn SheetBackend>> {
		self.backends.read().get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.backends.read().contains_key(name)
	}
}

pub struct LibrarySheetAdapter {
	events: SheetEventHandlers,
	backend: Arc<dyn SheetBackend>,
	/// A dismissal we asked the library for is in flight.
	closing: AtomicBool,
}

impl fmt::Debug for LibrarySheetAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LibrarySheetAdapter")
			.field("id", self.events.id())
			.field("closing", &self.closing.load(Ordering::Relaxed))
			.finish_non_exhaustive()
	}
}

impl LibrarySheetAdapter {
	pub const NAME: &'static str = "library-sheet";

	pub fn new(catalog: &BackendCatalog, backend: &str, events: SheetEventHandlers) -> Result<Self, AdapterError> {
		let Some(resolved) = catalog.resolve(backend) else {
			return Err(AdapterError::MissingDependency {
				adapter: Self::NAME,
				dependency: backend.to_string(),
			});
		};
		Ok(Self {
			events,
			backend: resolved,
			closing: AtomicBool::new(false),
		})
	}

	pub fn events(&self) -> &SheetEventHandlers {
		&self.events
	}

	/// The library finished presenting the sheet.
	pub fn library_presented(&self) {
		self.events.progress().set(PROGRESS_VISIBLE);
		self.events.handle_opened();
	}

	/// The library hid the sheet, either on our request or on its own (swipe,
	/// backdrop tap, its own close button).
	///
	/// A dismissal the library started is routed through the interceptor; when
	/// refused, the sheet is presented again.
	pub async fn library_dismissed(&self) -> CloseOutcome {
		self.events.progress().set(PROGRESS_HIDDEN);
		if self.closing.swap(false, Ordering::AcqRel) {
			self.events.handle_closed();
			return CloseOutcome::Closed;
		}

		let outcome = self.events.handle_dismiss().await;
		match outcome {
			CloseOutcome::Closed => {
				// Already hidden; the backend's dismiss from our `close` was a no-op.
				self.closing.store(false, Ordering::Release);
				self.events.handle_closed();
			}
			CloseOutcome::Blocked => {
				debug!(id = %self.events.id(), "library dismissal refused; presenting again");
				self.backend.present(self.events.id());
			}
			CloseOutcome::Ignored => {
				trace!(id = %self.events.id(), "library dismissal for inactive overlay");
			}
		}
		outcome
	}
}

impl OverlayAdapter for LibrarySheetAdapter {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn expand(&self) {
		self.closing.store(false, Ordering::Release);
		self.backend.present(self.events.id());
	}

	fn close(&self) {
		self.closing.store(true, Ordering::Release);
		self.backend.dismiss(self.events.id());
	}
}
