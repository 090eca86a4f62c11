//! Error types for adapter construction.

use thiserror::Error;

/// Errors raised while constructing an adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
	/// The adapter needs a backend that was never registered.
	#[error("{adapter} adapter requires the `{dependency}` backend, which is not installed")]
	MissingDependency {
		/// Name of the adapter being constructed.
		adapter: &'static str,
		/// Name of the backend it looked up.
		dependency: String,
	},

	/// Animation timings do not describe a playable animation.
	#[error("invalid animation config: {0}")]
	InvalidAnimation(String),
}
