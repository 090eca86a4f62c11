use proptest::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::json;

use crate::ids::{GroupId, OverlayId};
use crate::record::{OpenEntry, OpenMode, OverlayStatus};
use crate::registry::PortalSessions;
use crate::state::StackState;
use crate::transitions;

fn id(s: &str) -> OverlayId {
	OverlayId::from(s)
}

fn open(state: &mut StackState, entry: OpenEntry, mode: OpenMode) -> bool {
	let portals = PortalSessions::new();
	transitions::open(state, entry, mode, |id| portals.next(id))
}

/// Must keep each id at most once in the stack order, however often it is opened.
///
/// - Enforced in: `transitions::open`
/// - Failure symptom: One overlay renders twice and `close_all` closes it twice.
#[cfg_attr(test, test)]
pub(crate) fn test_open_is_idempotent() {
	let mut state = StackState::default();
	assert!(open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push));
	assert!(!open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push));
	assert_eq!(state.order().iter().filter(|x| **x == id("a")).count(), 1);
}

/// Must suspend the previous top on `switch` without destroying it.
///
/// - Enforced in: `transitions::open`
/// - Failure symptom: Going back from a detail sheet loses the list's params.
#[cfg_attr(test, test)]
pub(crate) fn test_switch_hides_previous_top() {
	let mut state = StackState::default();
	open(&mut state, OpenEntry::new("a", "root").params(json!({"page": 2})), OpenMode::Push);
	transitions::mark_open(&mut state, &id("a"));
	open(&mut state, OpenEntry::new("b", "root"), OpenMode::Switch);

	assert_eq!(state.status(&id("a")), Some(OverlayStatus::Hidden));
	assert_eq!(state.status(&id("b")), Some(OverlayStatus::Opening));
	assert_eq!(state.record(&id("a")).and_then(|r| r.params.clone()), Some(json!({"page": 2})));
}

/// Must tear down the previous top on `replace`.
///
/// - Enforced in: `transitions::open`, `transitions::finish_closing`
/// - Failure symptom: Replaced overlays linger in the stack and reappear on close.
#[cfg_attr(test, test)]
pub(crate) fn test_replace_tears_down_previous_top() {
	let mut state = StackState::default();
	open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push);
	transitions::mark_open(&mut state, &id("a"));
	open(&mut state, OpenEntry::new("b", "root"), OpenMode::Replace);
	assert_eq!(state.status(&id("a")), Some(OverlayStatus::Closing));

	transitions::finish_closing(&mut state, &id("a"));
	assert!(!state.contains(&id("a")));
	assert_eq!(state.order(), [id("b")]);
}

/// Must restore a suspended overlay as soon as the overlay above it starts closing.
///
/// - Enforced in: `transitions::start_closing`
/// - Failure symptom: Closing a switched-to overlay leaves an empty screen.
#[cfg_attr(test, test)]
pub(crate) fn test_close_restores_suspended_overlay() {
	let mut state = StackState::default();
	open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push);
	open(&mut state, OpenEntry::new("b", "root"), OpenMode::Switch);
	transitions::mark_open(&mut state, &id("b"));

	transitions::start_closing(&mut state, &id("b"));
	assert_eq!(state.status(&id("a")), Some(OverlayStatus::Opening));
	transitions::finish_closing(&mut state, &id("b"));
	assert_eq!(state.order(), [id("a")]);
	assert_eq!(state.status(&id("a")), Some(OverlayStatus::Opening));
}

/// Must not close a hidden overlay.
///
/// - Enforced in: `transitions::start_closing`
/// - Failure symptom: A suspended overlay animates out from under the visible one.
#[cfg_attr(test, test)]
pub(crate) fn test_hidden_is_not_closable() {
	let mut state = StackState::default();
	open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push);
	open(&mut state, OpenEntry::new("b", "root"), OpenMode::Switch);

	assert!(!transitions::start_closing(&mut state, &id("a")));
	assert_eq!(state.status(&id("a")), Some(OverlayStatus::Hidden));
}

/// Must keep a kept-mounted overlay as a dormant record after it closes.
///
/// - Enforced in: `transitions::finish_closing`, `transitions::open`
/// - Failure symptom: Reopening a persistent drawer loses its scroll position and params.
#[cfg_attr(test, test)]
pub(crate) fn test_keep_mounted_persists() {
	let mut state = StackState::default();
	open(
		&mut state,
		OpenEntry::new("drawer", "root").keep_mounted().params(json!({"tab": 1})),
		OpenMode::Push,
	);
	transitions::start_closing(&mut state, &id("drawer"));
	transitions::finish_closing(&mut state, &id("drawer"));
	assert_eq!(state.status(&id("drawer")), Some(OverlayStatus::Hidden));
	assert!(!state.in_stack(&id("drawer")));

	assert!(open(&mut state, OpenEntry::new("drawer", "root"), OpenMode::Push));
	assert_eq!(state.status(&id("drawer")), Some(OverlayStatus::Opening));
	assert_eq!(state.record(&id("drawer")).and_then(|r| r.params.clone()), Some(json!({"tab": 1})));
}

/// Must advance the portal session on every open, never reusing a value.
///
/// - Enforced in: `PortalSessions::next`, `transitions::open`
/// - Failure symptom: A reopened overlay renders into the stale portal of its previous session.
#[cfg_attr(test, test)]
pub(crate) fn test_portal_session_monotonic() {
	let portals = PortalSessions::new();
	let mut state = StackState::default();
	let mut last = 0;
	for _ in 0..3 {
		transitions::open(&mut state, OpenEntry::new("p", "root").portal(), OpenMode::Push, |id| portals.next(id));
		let session = state.record(&id("p")).map_or(0, |r| r.portal_session);
		assert!(session > last);
		last = session;
		transitions::start_closing(&mut state, &id("p"));
		transitions::finish_closing(&mut state, &id("p"));
		assert!(!state.contains(&id("p")));
	}
}

/// Must clear every record on `clear_all`, kept-mounted ones included.
///
/// - Enforced in: `transitions::clear_all`
/// - Failure symptom: A logout leaves a dormant drawer holding the previous user's data.
#[cfg_attr(test, test)]
pub(crate) fn test_clear_all_is_unconditional() {
	let mut state = StackState::default();
	transitions::mount(&mut state, OpenEntry::new("drawer", "root"));
	open(&mut state, OpenEntry::new("a", "root"), OpenMode::Push);
	open(&mut state, OpenEntry::new("x", "side"), OpenMode::Push);

	assert!(transitions::clear_all(&mut state));
	assert!(state.is_empty());
	assert!(state.order().is_empty());
}

#[derive(Debug, Clone)]
enum Op {
	Open(usize, OpenMode, bool, bool),
	MarkOpen(usize),
	StartClosing(usize),
	FinishClosing(usize),
	Mount(usize),
	Unmount(usize),
	ClearGroup(usize),
}

const IDS: [&str; 5] = ["a", "b", "c", "d", "e"];
const GROUPS: [&str; 2] = ["root", "side"];

fn arb_mode() -> impl Strategy<Value = OpenMode> {
	prop_oneof![Just(OpenMode::Push), Just(OpenMode::Switch), Just(OpenMode::Replace)]
}

fn arb_op() -> impl Strategy<Value = Op> {
	let ix = 0..IDS.len();
	prop_oneof![
		(ix.clone(), arb_mode(), any::<bool>(), any::<bool>()).prop_map(|(i, m, keep, side)| Op::Open(i, m, keep, side)),
		ix.clone().prop_map(Op::MarkOpen),
		ix.clone().prop_map(Op::StartClosing),
		ix.clone().prop_map(Op::FinishClosing),
		ix.clone().prop_map(Op::Mount),
		ix.prop_map(Op::Unmount),
		(0..GROUPS.len()).prop_map(Op::ClearGroup),
	]
}

fn group_for(side: bool) -> GroupId {
	GroupId::from(GROUPS[usize::from(side)])
}

proptest! {
	/// Any sequence of transitions keeps the order unique and backed by records,
	/// and every accepted open advances the portal session.
	#[test]
	fn prop_order_unique_and_sessions_monotonic(ops in prop::collection::vec(arb_op(), 0..64)) {
		let portals = PortalSessions::new();
		let mut state = StackState::default();
		let mut sessions: FxHashMap<OverlayId, u64> = FxHashMap::default();

		for op in ops {
			match op {
				Op::Open(i, mode, keep, side) => {
					let oid = id(IDS[i]);
					let mut entry = OpenEntry::new(oid.clone(), group_for(side)).portal();
					entry.keep_mounted = keep;
					if transitions::open(&mut state, entry, mode, |id| portals.next(id)) {
						let session = state.record(&oid).map_or(0, |r| r.portal_session);
						let previous = sessions.insert(oid.clone(), session).unwrap_or(0);
						prop_assert!(session > previous, "session of {oid} did not advance");
					}
				}
				Op::MarkOpen(i) => {
					transitions::mark_open(&mut state, &id(IDS[i]));
				}
				Op::StartClosing(i) => {
					transitions::start_closing(&mut state, &id(IDS[i]));
				}
				Op::FinishClosing(i) => {
					transitions::finish_closing(&mut state, &id(IDS[i]));
				}
				Op::Mount(i) => {
					transitions::mount(&mut state, OpenEntry::new(IDS[i], "root").portal());
				}
				Op::Unmount(i) => {
					transitions::unmount(&mut state, &id(IDS[i]));
				}
				Op::ClearGroup(g) => {
					transitions::clear_group(&mut state, &GroupId::from(GROUPS[g]));
				}
			}

			let mut seen = Vec::new();
			for oid in state.order() {
				prop_assert!(!seen.contains(oid), "duplicate {oid} in order");
				prop_assert!(state.contains(oid), "{oid} ordered without a record");
				seen.push(oid.clone());
			}
		}
	}
}
