use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(Arc<str>);

		impl $name {
			/// Creates an identifier from any string-like value.
			pub fn new(value: impl Into<Arc<str>>) -> Self {
				Self(value.into())
			}

			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}({:?})", stringify!($name), &*self.0)
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self::new(value)
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self::new(value)
			}
		}

		impl From<&$name> for $name {
			fn from(value: &$name) -> Self {
				value.clone()
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(&self.0)
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				String::deserialize(deserializer).map(Self::from)
			}
		}
	};
}

string_id!(
	/// Stable identity of one overlay instance, unique among tracked overlays.
	OverlayId
);

string_id!(
	/// Namespace of one independent stack. Overlays in different groups never interact.
	GroupId
);

impl Default for GroupId {
	fn default() -> Self {
		Self::new(DEFAULT_GROUP)
	}
}

/// Group used when neither the caller nor the configuration names one.
pub const DEFAULT_GROUP: &str = "root";
