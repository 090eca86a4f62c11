//! Concrete overlay adapters.
//!
//! Each adapter implements [`overstack_engine::OverlayAdapter`] for one overlay
//! technology and reports lifecycle events back through the
//! [`overstack_engine::SheetEventHandlers`] it was built with.
//!
//! - [`ModalAdapter`] - instant show/hide.
//! - [`AnimatedSheetAdapter`] - progress animated on the tokio timer, with drag and release.
//! - [`LibrarySheetAdapter`] - delegates to an optional [`SheetBackend`] resolved from a [`BackendCatalog`].

pub mod error;
pub mod library;
pub mod modal;
pub mod sheet;

pub use error::AdapterError;
pub use library::{BackendCatalog, LibrarySheetAdapter, SheetBackend};
pub use modal::{DismissGesture, ModalAdapter};
pub use sheet::{AnimatedSheetAdapter, DISMISS_THRESHOLD, SheetAnimationConfig};
