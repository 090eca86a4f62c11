//! Consumer-facing control API.
//!
//! An [`OverlayStack`] is created once at the application root and owns the
//! store, the registries and the coordinator. Multiple stacks never share
//! state, which keeps independent hosts and tests isolated.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::adapter::OverlayAdapter;
use crate::config::StackConfig;
use crate::coordinator::{CloseAllOptions, CloseAllOutcome, CloseOutcome, Coordinator, SheetEventHandlers};
use crate::error::{Result, StackError};
use crate::ids::{GroupId, OverlayId};
use crate::interceptor::{BeforeClose, InterceptorRegistry};
use crate::presentation;
use crate::record::{OpenEntry, OpenMode, OverlayContent, OverlayRecord, OverlayStatus, Params};
use crate::registry::{OverlayRegistry, ProgressValue, portal_channel};
use crate::store::StackStore;

#[derive(Debug, Clone)]
enum OpenTarget {
	/// Named overlay whose UI is teleported in through a portal.
	Portal(OverlayId),
	/// Inline content; the id is minted unless one is given.
	Content(Option<OverlayId>, OverlayContent),
}

/// Options for [`OverlayStack::open`].
#[derive(Debug, Clone)]
#[must_use]
pub struct OpenRequest {
	target: OpenTarget,
	mode: Option<OpenMode>,
	group: Option<GroupId>,
	scale_background: Option<bool>,
	params: Option<Params>,
	keep_mounted: bool,
}

impl OpenRequest {
	fn with_target(target: OpenTarget) -> Self {
		Self {
			target,
			mode: None,
			group: None,
			scale_background: None,
			params: None,
			keep_mounted: false,
		}
	}

	/// Opens the portal-rendered overlay registered under `id`.
	pub fn portal(id: impl Into<OverlayId>) -> Self {
		Self::with_target(OpenTarget::Portal(id.into()))
	}

	/// Opens inline `content` under a freshly minted id.
	pub fn content(content: OverlayContent) -> Self {
		Self::with_target(OpenTarget::Content(None, content))
	}

	/// Uses `id` instead of minting one for inline content.
	pub fn id(mut self, id: impl Into<OverlayId>) -> Self {
		match &mut self.target {
			OpenTarget::Portal(existing) => *existing = id.into(),
			OpenTarget::Content(existing, _) => *existing = Some(id.into()),
		}
		self
	}

	pub fn mode(mut self, mode: OpenMode) -> Self {
		self.mode = Some(mode);
		self
	}

	pub fn group(mut self, group: impl Into<GroupId>) -> Self {
		self.group = Some(group.into());
		self
	}

	pub fn scale_background(mut self, scale: bool) -> Self {
		self.scale_background = Some(scale);
		self
	}

	pub fn params(mut self, params: Params) -> Self {
		self.params = Some(params);
		self
	}

	pub fn keep_mounted(mut self) -> Self {
		self.keep_mounted = true;
		self
	}
}

/// Application-root owner of one overlay stack.
#[derive(Debug)]
pub struct OverlayStack {
	config: StackConfig,
	store: Arc<StackStore>,
	registry: Arc<OverlayRegistry>,
	interceptors: Arc<InterceptorRegistry>,
	coordinator: Coordinator,
	minted: AtomicU64,
}

impl Default for OverlayStack {
	fn default() -> Self {
		Self::new(StackConfig::default())
	}
}

impl OverlayStack {
	pub fn new(config: StackConfig) -> Self {
		let registry = Arc::new(OverlayRegistry::new());
		let store = Arc::new(StackStore::new(Arc::clone(&registry.portals)));
		let interceptors = Arc::new(InterceptorRegistry::new());
		let coordinator = Coordinator::new(
			Arc::clone(&store),
			Arc::clone(&registry),
			Arc::clone(&interceptors),
			config.close_ack_timeout(),
		);
		coordinator.attach(&config.default_group);
		Self {
			config,
			store,
			registry,
			interceptors,
			coordinator,
			minted: AtomicU64::new(0),
		}
	}

	/// Builds a stack from a TOML config file.
	pub fn from_config_file(path: &Path) -> Result<Self> {
		let config = StackConfig::load(path)?;
		debug!(path = %path.display(), prefix = %config.id_prefix, "overlay.stack from config file");
		Ok(Self::new(config))
	}

	pub fn config(&self) -> &StackConfig {
		&self.config
	}

	pub fn store(&self) -> &Arc<StackStore> {
		&self.store
	}

	pub fn registry(&self) -> &Arc<OverlayRegistry> {
		&self.registry
	}

	pub fn interceptors(&self) -> &Arc<InterceptorRegistry> {
		&self.interceptors
	}

	pub fn coordinator(&self) -> &Coordinator {
		&self.coordinator
	}

	/// Opens an overlay and returns its id.
	///
	/// Opening an id that is already active is a no-op that still returns the id.
	pub fn open(&self, request: OpenRequest) -> OverlayId {
		let (entry, mode) = self.entry_for(request);
		let id = entry.id.clone();
		self.coordinator.attach(&entry.group);
		if !self.store.open(entry, mode) {
			debug!(id = %id, "open ignored: overlay already active");
		}
		id
	}

	/// Registers a kept-mounted overlay that starts hidden outside the stack.
	pub fn mount(&self, request: OpenRequest) -> OverlayId {
		let (entry, _) = self.entry_for(request.keep_mounted());
		let id = entry.id.clone();
		self.coordinator.attach(&entry.group);
		self.store.mount(entry);
		id
	}

	pub fn unmount(&self, id: &OverlayId) -> bool {
		self.store.unmount(id)
	}

	fn entry_for(&self, request: OpenRequest) -> (OpenEntry, OpenMode) {
		let group = request.group.unwrap_or_else(|| self.config.default_group.clone());
		let mode = request.mode.unwrap_or(self.config.default_mode);
		let mut entry = match request.target {
			OpenTarget::Portal(id) => OpenEntry::new(id, group).portal(),
			OpenTarget::Content(id, content) => OpenEntry::new(id.unwrap_or_else(|| self.mint_id()), group).content(content),
		};
		entry.keep_mounted = request.keep_mounted;
		entry.params = request.params;
		entry.scale_background = request.scale_background;
		entry.prevent_dismiss = self.interceptors.contains(&entry.id);
		(entry, mode)
	}

	fn mint_id(&self) -> OverlayId {
		let n = self.minted.fetch_add(1, Ordering::Relaxed) + 1;
		OverlayId::new(format!("{}-{n}", self.config.id_prefix))
	}

	/// Interceptor-aware close; same as [`Self::request_close`].
	pub async fn close(&self, id: &OverlayId) -> CloseOutcome {
		self.request_close(id).await
	}

	pub async fn request_close(&self, id: &OverlayId) -> CloseOutcome {
		self.coordinator.request_close(id).await
	}

	/// Closes `id` even if an interceptor would refuse.
	pub fn force_close(&self, id: &OverlayId) -> CloseOutcome {
		self.coordinator.force_close(id)
	}

	/// Closes the default group top to bottom.
	pub async fn close_all(&self, options: CloseAllOptions) -> CloseAllOutcome {
		self.close_all_in(&self.config.default_group, options).await
	}

	pub async fn close_all_in(&self, group: &GroupId, options: CloseAllOptions) -> CloseAllOutcome {
		let stagger = options.stagger.unwrap_or_else(|| self.config.stagger());
		self.coordinator.close_all(group, stagger).await
	}

	pub fn update_params(&self, id: &OverlayId, params: Params) -> bool {
		self.store.update_params(id, params)
	}

	pub fn reset_params(&self, id: &OverlayId) -> bool {
		self.store.reset_params(id)
	}

	/// Hard reset of one group; kept-mounted overlays are dropped too.
	pub fn clear_group(&self, group: &GroupId) -> bool {
		self.store.clear_group(group)
	}

	pub fn clear_all(&self) -> bool {
		self.store.clear_all()
	}

	/// Registers the before-close interceptor for `id`, replacing any previous one.
	///
	/// The overlay's `prevent_dismiss` flag stays set while the returned guard
	/// lives. Dropping the guard unregisters this registration only.
	pub fn register_before_close(&self, id: &OverlayId, interceptor: BeforeClose) -> InterceptorGuard {
		let token = self.interceptors.register(id.clone(), interceptor);
		self.store.set_prevent_dismiss(id, true);
		InterceptorGuard {
			id: id.clone(),
			token,
			interceptors: Arc::downgrade(&self.interceptors),
			store: Arc::downgrade(&self.store),
		}
	}

	/// Mounts `adapter` as the control handle for `id` and returns its event handlers.
	pub fn attach_adapter(&self, id: &OverlayId, adapter: Arc<dyn OverlayAdapter>) -> SheetEventHandlers {
		self.coordinator.register_handle(id.clone(), adapter);
		self.coordinator.event_handlers(id)
	}

	/// Forgets the handle and progress value once the rendering unmounts.
	pub fn detach_adapter(&self, id: &OverlayId) {
		self.coordinator.release_handle(id);
	}

	/// Reverse channel for adapters of `id`.
	pub fn event_handlers(&self, id: &OverlayId) -> SheetEventHandlers {
		self.coordinator.event_handlers(id)
	}

	pub fn progress(&self, id: &OverlayId) -> ProgressValue {
		self.registry.progress.get_or_create(id)
	}

	pub fn record(&self, id: &OverlayId) -> Option<OverlayRecord> {
		self.store.record(id)
	}

	pub fn status(&self, id: &OverlayId) -> Option<OverlayStatus> {
		self.store.status(id)
	}

	/// Portal channel the overlay's current session renders into.
	pub fn portal_channel(&self, id: &OverlayId) -> Option<String> {
		self.store
			.record(id)
			.filter(|r| r.use_portal)
			.map(|r| portal_channel(id, r.portal_session))
	}

	pub fn render_queue(&self, group: &GroupId) -> Vec<OverlayId> {
		presentation::render_queue(&self.store.snapshot(), group)
	}

	pub fn is_top(&self, id: &OverlayId) -> bool {
		presentation::is_top(&self.store.snapshot(), id)
	}

	pub fn scale_depth(&self, id: &OverlayId) -> usize {
		presentation::scale_depth(&self.store.snapshot(), id)
	}

	/// Overlay-scoped handle for `id`.
	///
	/// # Errors
	///
	/// [`StackError::NoActiveOverlay`] when `id` is not tracked.
	pub fn scope(&self, id: &OverlayId) -> Result<OverlayScope<'_>> {
		if !self.store.contains(id) {
			return Err(StackError::NoActiveOverlay {
				api: "OverlayStack::scope",
				id: id.clone(),
			});
		}
		Ok(OverlayScope { id: id.clone(), stack: self })
	}
}

/// Unregisters a before-close interceptor when dropped.
#[must_use = "dropping the guard unregisters the interceptor"]
#[derive(Debug)]
pub struct InterceptorGuard {
	id: OverlayId,
	token: u64,
	interceptors: Weak<InterceptorRegistry>,
	store: Weak<StackStore>,
}

impl InterceptorGuard {
	pub fn id(&self) -> &OverlayId {
		&self.id
	}
}

impl Drop for InterceptorGuard {
	fn drop(&mut self) {
		let Some(interceptors) = self.interceptors.upgrade() else {
			return;
		};
		if interceptors.unregister_token(&self.id, self.token)
			&& let Some(store) = self.store.upgrade()
		{
			store.set_prevent_dismiss(&self.id, false);
		}
	}
}

/// APIs bound to one tracked overlay.
#[derive(Debug, Clone)]
pub struct OverlayScope<'a> {
	id: OverlayId,
	stack: &'a OverlayStack,
}

impl OverlayScope<'_> {
	pub fn id(&self) -> &OverlayId {
		&self.id
	}

	pub fn status(&self) -> Option<OverlayStatus> {
		self.stack.status(&self.id)
	}

	pub fn params(&self) -> Option<Params> {
		self.stack.record(&self.id).and_then(|r| r.params)
	}

	pub async fn close(&self) -> CloseOutcome {
		self.stack.request_close(&self.id).await
	}

	pub fn force_close(&self) -> CloseOutcome {
		self.stack.force_close(&self.id)
	}

	pub fn update_params(&self, params: Params) -> bool {
		self.stack.update_params(&self.id, params)
	}

	pub fn reset_params(&self) -> bool {
		self.stack.reset_params(&self.id)
	}

	pub fn register_before_close(&self, interceptor: BeforeClose) -> InterceptorGuard {
		self.stack.register_before_close(&self.id, interceptor)
	}

	pub fn event_handlers(&self) -> SheetEventHandlers {
		self.stack.event_handlers(&self.id)
	}

	pub fn progress(&self) -> ProgressValue {
		self.stack.progress(&self.id)
	}
}
