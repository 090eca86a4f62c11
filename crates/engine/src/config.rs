//! Stack-wide defaults, loadable from TOML.
//!
//! ```toml
//! default_group = "root"
//! default_mode = "push"
//! stagger_ms = 80
//! close_ack_timeout_ms = 1000
//! id_prefix = "sheet"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ids::{DEFAULT_GROUP, GroupId};
use crate::record::OpenMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
	/// Group used when an open request names none.
	pub default_group: GroupId,
	/// Mode used when an open request names none.
	pub default_mode: OpenMode,
	/// Default delay between closes in a close-all cascade.
	pub stagger_ms: u64,
	/// How long a staggered cascade waits for a close to be acknowledged.
	pub close_ack_timeout_ms: u64,
	/// Prefix of ids minted for content-only open requests.
	pub id_prefix: String,
}

impl Default for StackConfig {
	fn default() -> Self {
		Self {
			default_group: GroupId::new(DEFAULT_GROUP),
			default_mode: OpenMode::Push,
			stagger_ms: 0,
			close_ack_timeout_ms: 1000,
			id_prefix: "overlay".to_string(),
		}
	}
}

impl StackConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.default_group.as_str().is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "default_group",
				reason: "group names must not be empty".to_string(),
			});
		}
		if self.id_prefix.is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "id_prefix",
				reason: "generated ids need a prefix".to_string(),
			});
		}
		if self.close_ack_timeout_ms == 0 && self.stagger_ms > 0 {
			return Err(ConfigError::InvalidValue {
				field: "close_ack_timeout_ms",
				reason: "a staggered cascade needs a nonzero acknowledgement timeout".to_string(),
			});
		}
		Ok(())
	}

	pub fn stagger(&self) -> Duration {
		Duration::from_millis(self.stagger_ms)
	}

	pub fn close_ack_timeout(&self) -> Duration {
		Duration::from_millis(self.close_ack_timeout_ms)
	}
}
