//! Error types for the overlay stack.

use std::path::PathBuf;

use thiserror::Error;

use crate::ids::OverlayId;

/// Usage errors: structural wiring mistakes to fix at development time.
///
/// Runtime races (absent ids, repeated events) are never errors; those
/// operations are no-ops instead.
#[derive(Debug, Error)]
pub enum StackError {
	/// An overlay-scoped API was used for an id that is not tracked.
	#[error("{api} must be used inside an active overlay, but `{id}` is not tracked by the stack")]
	NoActiveOverlay {
		/// The API that required the overlay context.
		api: &'static str,
		/// The id the caller assumed was active.
		id: OverlayId,
	},

	/// Loading the stack configuration failed.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A value parsed but is out of range.
	#[error("invalid value for `{field}`: {reason}")]
	InvalidValue {
		field: &'static str,
		reason: String,
	},
}

/// Result type for stack operations that can fail.
pub type Result<T> = std::result::Result<T, StackError>;
