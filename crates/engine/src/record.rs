use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, OverlayId};

/// Caller-supplied structured payload attached to an overlay.
pub type Params = serde_json::Value;

/// Lifecycle status of an overlay record.
///
/// Absence from the store is the implicit terminal state of overlays that are
/// not kept mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStatus {
	/// Expand has been requested; waiting for the adapter to report it visible.
	Opening,
	/// Fully presented.
	Open,
	/// Close has been requested; waiting for the adapter to report it hidden.
	Closing,
	/// Suspended below another overlay, or dormant while kept mounted.
	Hidden,
}

impl OverlayStatus {
	/// Returns true for `Opening` and `Open`.
	pub const fn is_active(self) -> bool {
		matches!(self, Self::Opening | Self::Open)
	}
}

/// How opening a new overlay treats the current top of its group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
	/// Stack on top, leaving the previous top untouched.
	#[default]
	Push,
	/// Suspend the previous top (`Hidden`) so it can be restored later.
	Switch,
	/// Tear down the previous top (`Closing`).
	Replace,
}

/// Opaque renderable payload. Equality is identity.
#[derive(Clone)]
pub struct OverlayContent(Arc<dyn Any + Send + Sync>);

impl OverlayContent {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self(Arc::new(value))
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref()
	}
}

impl PartialEq for OverlayContent {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for OverlayContent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("OverlayContent(..)")
	}
}

/// One logical overlay instance as tracked by the stack store.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRecord {
	pub id: OverlayId,
	pub group: GroupId,
	/// `None` when the real UI tree is teleported in through a portal.
	pub content: Option<OverlayContent>,
	pub status: OverlayStatus,
	pub use_portal: bool,
	/// Survives a close as `Hidden` instead of being destroyed.
	pub keep_mounted: bool,
	pub params: Option<Params>,
	/// Opening this overlay visually depresses the overlays beneath it.
	pub scale_background: bool,
	/// Scopes the portal channel name; advanced on every open of a portal overlay.
	pub portal_session: u64,
	/// Distinguishes successive lifetimes of the same id; advanced on every accepted open or mount.
	pub instance: u64,
	/// Set while a before-close interceptor is registered for this overlay.
	pub prevent_dismiss: bool,
}

/// Input to the `open` and `mount` transitions.
///
/// Optional fields left as `None` keep the values of a dormant kept-mounted
/// record being reactivated.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenEntry {
	pub id: OverlayId,
	pub group: GroupId,
	pub content: Option<OverlayContent>,
	pub use_portal: bool,
	pub keep_mounted: bool,
	pub params: Option<Params>,
	pub scale_background: Option<bool>,
	pub prevent_dismiss: bool,
}

impl OpenEntry {
	pub fn new(id: impl Into<OverlayId>, group: impl Into<GroupId>) -> Self {
		Self {
			id: id.into(),
			group: group.into(),
			content: None,
			use_portal: false,
			keep_mounted: false,
			params: None,
			scale_background: None,
			prevent_dismiss: false,
		}
	}

	pub fn content(mut self, content: OverlayContent) -> Self {
		self.content = Some(content);
		self
	}

	pub fn portal(mut self) -> Self {
		self.use_portal = true;
		self
	}

	pub fn keep_mounted(mut self) -> Self {
		self.keep_mounted = true;
		self
	}

	pub fn params(mut self, params: Params) -> Self {
		self.params = Some(params);
		self
	}

	pub fn scale_background(mut self, scale: bool) -> Self {
		self.scale_background = Some(scale);
		self
	}

	/// Builds a fresh record in `status`, with no prior state to merge.
	pub(crate) fn into_record(self, status: OverlayStatus) -> OverlayRecord {
		OverlayRecord {
			id: self.id,
			group: self.group,
			content: self.content,
			status,
			use_portal: self.use_portal,
			keep_mounted: self.keep_mounted,
			params: self.params,
			scale_background: self.scale_background.unwrap_or(false),
			portal_session: 0,
			instance: 0,
			prevent_dismiss: self.prevent_dismiss,
		}
	}
}
