//! Overlay stack coordination.
//!
//! A declarative stack of overlays (sheets, modals, dialogs) kept in sync with
//! the imperative adapters that present them.
//!
//! # Layers
//!
//! - [`store`] - the single source of truth: records, stack order, selector
//!   subscriptions. Mutations are the pure functions in [`transitions`].
//! - [`registry`] - per-overlay side tables: adapter handles, progress
//!   values, portal sessions.
//! - [`interceptor`] - before-close vetoes, one per overlay.
//! - [`coordinator`] - diffs store snapshots into `expand()`/`close()`
//!   commands and routes adapter events back into the store.
//! - [`stack`] - [`OverlayStack`], the consumer control API, and
//!   [`OverlayScope`] for code running inside one overlay.
//! - [`presentation`] - read-only derivations for hosts.
//!
//! # Lifecycle
//!
//! ```text
//! (absent) --open--> opening --handle_opened--> open
//!    ^                  |                         |
//!    |                  +------request_close------+--> closing --handle_closed--> (absent | hidden)
//!    |                                                                                 |
//!    +------------------------------ unmount ------------------------------------------+
//! ```

pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ids;
pub mod interceptor;
pub mod presentation;
pub mod record;
pub mod registry;
pub mod stack;
pub mod state;
pub mod store;
pub mod transitions;

#[cfg(test)]
mod invariants;

pub use adapter::OverlayAdapter;
pub use config::StackConfig;
pub use coordinator::{CloseAllOptions, CloseAllOutcome, CloseOutcome, Coordinator, SheetEventHandlers};
pub use error::{ConfigError, Result, StackError};
pub use ids::{DEFAULT_GROUP, GroupId, OverlayId};
pub use interceptor::{BeforeClose, BoxFutureStatic, CloseDecision, InterceptorRegistry};
pub use record::{OpenEntry, OpenMode, OverlayContent, OverlayRecord, OverlayStatus, Params};
pub use registry::{OverlayRegistry, PROGRESS_HIDDEN, PROGRESS_VISIBLE, ProgressValue, portal_channel};
pub use stack::{InterceptorGuard, OpenRequest, OverlayScope, OverlayStack};
pub use state::StackState;
pub use store::{StackStore, Subscription};
