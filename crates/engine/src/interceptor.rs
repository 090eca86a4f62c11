//! Before-close interceptors: per-overlay vetoes on dismissal.
//!
//! An interceptor either receives a [`CloseDecision`] and resolves it whenever
//! it likes (after an alert, say), or is a predicate resolving to a boolean
//! where `false` blocks. Resolution is always awaited, even when the callback
//! decides synchronously.
//!
//! # Failure Modes
//!
//! Every failure blocks the close, so user data is never lost to a broken
//! interceptor:
//!
//! - callback panics,
//! - predicate resolves to `Err` or its task panics,
//! - the decision handle is dropped without `confirm`/`cancel`.

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::warn;

use crate::ids::OverlayId;

/// A pinned, boxed future that is required to be Send and 'static.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type DecisionFn = dyn Fn(CloseDecision) + Send + Sync;
type PredicateFn = dyn Fn() -> BoxFutureStatic<anyhow::Result<bool>> + Send + Sync;

/// One-shot answer handed to a decision-style interceptor.
pub struct CloseDecision {
	tx: oneshot::Sender<bool>,
}

impl CloseDecision {
	/// Lets the close proceed.
	pub fn confirm(self) {
		let _ = self.tx.send(true);
	}

	/// Blocks the close.
	pub fn cancel(self) {
		let _ = self.tx.send(false);
	}
}

impl fmt::Debug for CloseDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CloseDecision").field("resolved", &self.tx.is_closed()).finish()
	}
}

/// A registered before-close callback.
#[derive(Clone)]
pub enum BeforeClose {
	Decision(Arc<DecisionFn>),
	Predicate(Arc<PredicateFn>),
}

impl BeforeClose {
	/// Interceptor that resolves the handed [`CloseDecision`] on its own time.
	pub fn decision(f: impl Fn(CloseDecision) + Send + Sync + 'static) -> Self {
		Self::Decision(Arc::new(f))
	}

	/// Interceptor resolving to `true` (allow) or `false` (block).
	pub fn predicate<F, Fut>(f: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
	{
		Self::Predicate(Arc::new(move || Box::pin(f()) as BoxFutureStatic<_>))
	}

	/// Synchronous boolean predicate.
	pub fn allow_if(f: impl Fn() -> bool + Send + Sync + 'static) -> Self {
		Self::predicate(move || std::future::ready(Ok(f())))
	}

	/// Asks the interceptor and awaits its answer. Any failure blocks.
	pub async fn evaluate(&self, id: &OverlayId) -> bool {
		match self {
			Self::Decision(callback) => {
				let (tx, rx) = oneshot::channel();
				if catch_unwind(AssertUnwindSafe(|| callback(CloseDecision { tx }))).is_err() {
					warn!(id = %id, "before-close callback panicked; blocking close");
					return false;
				}
				match rx.await {
					Ok(allow) => allow,
					Err(_) => {
						warn!(id = %id, "before-close decision dropped unresolved; blocking close");
						false
					}
				}
			}
			Self::Predicate(predicate) => {
				let future = match catch_unwind(AssertUnwindSafe(|| predicate())) {
					Ok(future) => future,
					Err(_) => {
						warn!(id = %id, "before-close predicate panicked; blocking close");
						return false;
					}
				};
				match tokio::spawn(future).await {
					Ok(Ok(allow)) => allow,
					Ok(Err(error)) => {
						warn!(id = %id, %error, "before-close predicate failed; blocking close");
						false
					}
					Err(error) => {
						warn!(id = %id, %error, "before-close predicate task failed; blocking close");
						false
					}
				}
			}
		}
	}
}

impl fmt::Debug for BeforeClose {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Decision(_) => f.write_str("BeforeClose::Decision(..)"),
			Self::Predicate(_) => f.write_str("BeforeClose::Predicate(..)"),
		}
	}
}

struct Registered {
	token: u64,
	callback: BeforeClose,
}

/// At most one interceptor per overlay id; registering again replaces.
#[derive(Default)]
pub struct InterceptorRegistry {
	inner: Mutex<FxHashMap<OverlayId, Registered>>,
	next_token: AtomicU64,
}

impl fmt::Debug for InterceptorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let guard = self.inner.lock();
		let mut ids: Vec<_> = guard.keys().map(OverlayId::as_str).collect();
		ids.sort_unstable();
		f.debug_struct("InterceptorRegistry").field("ids", &ids).finish()
	}
}

impl InterceptorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs `callback` for `id`, returning a token that identifies this registration.
	pub fn register(&self, id: OverlayId, callback: BeforeClose) -> u64 {
		let token = self.next_token.fetch_add(1, Ordering::Relaxed);
		self.inner.lock().insert(id, Registered { token, callback });
		token
	}

	/// Removes whatever is registered for `id`. Absent ids are a no-op.
	pub fn unregister(&self, id: &OverlayId) -> bool {
		self.inner.lock().remove(id).is_some()
	}

	/// Removes the registration only if it is still the one `token` names.
	pub fn unregister_token(&self, id: &OverlayId, token: u64) -> bool {
		let mut guard = self.inner.lock();
		if guard.get(id).is_some_and(|r| r.token == token) {
			guard.remove(id);
			return true;
		}
		false
	}

	pub fn get(&self, id: &OverlayId) -> Option<BeforeClose> {
		self.inner.lock().get(id).map(|r| r.callback.clone())
	}

	pub fn contains(&self, id: &OverlayId) -> bool {
		self.inner.lock().contains_key(id)
	}

	pub fn clear(&self) {
		self.inner.lock().clear();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	fn id() -> OverlayId {
		OverlayId::from("form")
	}

	#[tokio::test]
	async fn decision_resolves_asynchronously() {
		let held = Arc::new(Mutex::new(None));
		let slot = Arc::clone(&held);
		let interceptor = BeforeClose::decision(move |decision| *slot.lock() = Some(decision));

		let task = tokio::spawn({
			let interceptor = interceptor.clone();
			async move { interceptor.evaluate(&id()).await }
		});
		tokio::task::yield_now().await;
		assert!(!task.is_finished());

		let decision = held.lock().take().expect("callback ran");
		decision.confirm();
		assert!(task.await.expect("task completes"));
	}

	#[tokio::test]
	async fn dropped_decision_blocks() {
		let interceptor = BeforeClose::decision(drop);
		assert!(!interceptor.evaluate(&id()).await);
	}

	#[tokio::test]
	async fn panicking_callback_blocks() {
		let interceptor = BeforeClose::decision(|_| panic!("alert failed"));
		assert!(!interceptor.evaluate(&id()).await);
	}

	#[tokio::test]
	async fn predicate_results_map_to_decisions() {
		assert!(BeforeClose::allow_if(|| true).evaluate(&id()).await);
		assert!(!BeforeClose::allow_if(|| false).evaluate(&id()).await);
		let failing = BeforeClose::predicate(|| async { Err(anyhow::anyhow!("storage unavailable")) });
		assert!(!failing.evaluate(&id()).await);
	}

	#[test]
	fn stale_token_does_not_remove_newer_registration() {
		let registry = InterceptorRegistry::new();
		let first = registry.register(id(), BeforeClose::allow_if(|| true));
		let second = registry.register(id(), BeforeClose::allow_if(|| false));
		assert_ne!(first, second);

		assert!(!registry.unregister_token(&id(), first));
		assert!(registry.contains(&id()));
		assert!(registry.unregister_token(&id(), second));
		assert!(!registry.unregister(&id()));
	}

	#[tokio::test]
	async fn predicate_is_asked_once_per_evaluation() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let interceptor = BeforeClose::allow_if(move || {
			counter.fetch_add(1, Ordering::SeqCst);
			true
		});
		interceptor.evaluate(&id()).await;
		interceptor.evaluate(&id()).await;
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}
}
