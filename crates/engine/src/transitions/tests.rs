use serde_json::json;

use super::*;

fn id(s: &str) -> OverlayId {
	OverlayId::from(s)
}

fn entry(s: &str) -> OpenEntry {
	OpenEntry::new(s, "root")
}

fn no_session(_: &OverlayId) -> u64 {
	panic!("non-portal overlays never take a portal session")
}

fn status(state: &StackState, s: &str) -> Option<OverlayStatus> {
	state.status(&id(s))
}

fn order(state: &StackState) -> Vec<&str> {
	state.order().iter().map(OverlayId::as_str).collect()
}

fn opened(names: &[&str]) -> StackState {
	let mut state = StackState::default();
	for name in names {
		assert!(open(&mut state, entry(name), OpenMode::Push, no_session));
		assert!(mark_open(&mut state, &id(name)));
	}
	state
}

#[test]
fn open_on_fresh_stack_starts_opening() {
	let mut state = StackState::default();
	assert!(open(&mut state, entry("a"), OpenMode::Push, no_session));
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Opening));
	assert_eq!(order(&state), ["a"]);
}

#[test]
fn switch_on_fresh_stack_behaves_like_push() {
	let mut pushed = StackState::default();
	let mut switched = StackState::default();
	open(&mut pushed, entry("x").params(json!({"n": 1})), OpenMode::Push, no_session);
	open(&mut switched, entry("x").params(json!({"n": 1})), OpenMode::Switch, no_session);
	assert_eq!(pushed, switched);
}

#[test]
fn duplicate_open_is_rejected() {
	let mut state = opened(&["a"]);
	assert!(!open(&mut state, entry("a"), OpenMode::Push, no_session));
	assert_eq!(order(&state), ["a"]);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Open));
}

#[test]
fn push_leaves_previous_top_untouched() {
	let mut state = opened(&["a"]);
	open(&mut state, entry("b"), OpenMode::Push, no_session);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Open));
	assert!(start_closing(&mut state, &id("b")));
	assert!(finish_closing(&mut state, &id("b")));
	assert_eq!(order(&state), ["a"]);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Open));
}

#[test]
fn switch_hides_previous_top_and_keeps_its_params() {
	let mut state = StackState::default();
	open(&mut state, entry("a").params(json!({"page": 2})), OpenMode::Push, no_session);
	mark_open(&mut state, &id("a"));

	open(&mut state, entry("b"), OpenMode::Switch, no_session);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Hidden));
	assert_eq!(status(&state, "b"), Some(OverlayStatus::Opening));
	assert_eq!(state.record(&id("a")).and_then(|r| r.params.clone()), Some(json!({"page": 2})));
	assert_eq!(order(&state), ["a", "b"]);
}

#[test]
fn replace_closes_previous_top_and_finish_removes_it() {
	let mut state = opened(&["a"]);
	open(&mut state, entry("b"), OpenMode::Replace, no_session);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Closing));
	assert_eq!(status(&state, "b"), Some(OverlayStatus::Opening));

	assert!(finish_closing(&mut state, &id("a")));
	assert_eq!(status(&state, "a"), None);
	assert_eq!(order(&state), ["b"]);
	assert_eq!(status(&state, "b"), Some(OverlayStatus::Opening));
}

#[test]
fn start_closing_restores_hidden_overlay_below() {
	let mut state = opened(&["a"]);
	open(&mut state, entry("b"), OpenMode::Switch, no_session);
	mark_open(&mut state, &id("b"));

	assert!(start_closing(&mut state, &id("b")));
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Opening));
	assert!(finish_closing(&mut state, &id("b")));
	assert_eq!(order(&state), ["a"]);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Opening));
}

#[test]
fn hidden_overlay_cannot_start_closing() {
	let mut state = opened(&["a"]);
	open(&mut state, entry("b"), OpenMode::Switch, no_session);
	let before = state.clone();
	assert!(!start_closing(&mut state, &id("a")));
	assert_eq!(state, before);
}

#[test]
fn closing_twice_is_a_no_op() {
	let mut state = opened(&["a"]);
	assert!(start_closing(&mut state, &id("a")));
	assert!(!start_closing(&mut state, &id("a")));
	assert!(finish_closing(&mut state, &id("a")));
	assert!(!finish_closing(&mut state, &id("a")));
	assert!(state.is_empty());
}

#[test]
fn unknown_ids_are_ignored() {
	let mut state = opened(&["a"]);
	let before = state.clone();
	let ghost = id("ghost");
	assert!(!mark_open(&mut state, &ghost));
	assert!(!start_closing(&mut state, &ghost));
	assert!(!finish_closing(&mut state, &ghost));
	assert!(!update_params(&mut state, &ghost, Some(json!(1))));
	assert!(!unmount(&mut state, &ghost));
	assert_eq!(state, before);
}

#[test]
fn keep_mounted_survives_close_and_reactivates_with_params() {
	let mut state = StackState::default();
	open(
		&mut state,
		entry("settings").keep_mounted().params(json!({"tab": "general"})),
		OpenMode::Push,
		no_session,
	);
	mark_open(&mut state, &id("settings"));
	start_closing(&mut state, &id("settings"));
	assert!(finish_closing(&mut state, &id("settings")));

	assert_eq!(status(&state, "settings"), Some(OverlayStatus::Hidden));
	assert!(order(&state).is_empty());
	assert!(state.is_dormant(&id("settings")));

	assert!(open(&mut state, entry("settings"), OpenMode::Push, no_session));
	let record = state.record(&id("settings")).expect("record retained");
	assert_eq!(record.status, OverlayStatus::Opening);
	assert_eq!(record.params, Some(json!({"tab": "general"})));
	assert!(record.keep_mounted);

	start_closing(&mut state, &id("settings"));
	finish_closing(&mut state, &id("settings"));
	open(&mut state, entry("settings").params(json!({"tab": "privacy"})), OpenMode::Push, no_session);
	assert_eq!(state.record(&id("settings")).and_then(|r| r.params.clone()), Some(json!({"tab": "privacy"})));
}

#[test]
fn portal_sessions_advance_on_every_open() {
	let mut state = StackState::default();
	let mut counter = 0;
	let mut sessions = Vec::new();
	for _ in 0..3 {
		assert!(open(&mut state, entry("sheet").portal(), OpenMode::Push, |_| {
			counter += 1;
			counter
		}));
		sessions.push(state.record(&id("sheet")).map(|r| r.portal_session));
		start_closing(&mut state, &id("sheet"));
		finish_closing(&mut state, &id("sheet"));
	}
	assert_eq!(sessions, [Some(1), Some(2), Some(3)]);
}

#[test]
fn rejected_open_does_not_take_a_portal_session() {
	let mut state = StackState::default();
	open(&mut state, entry("sheet").portal(), OpenMode::Push, |_| 1);
	assert!(!open(&mut state, entry("sheet").portal(), OpenMode::Push, |_| panic!("session taken")));
}

#[test]
fn clear_all_ignores_keep_mounted() {
	let mut state = opened(&["a"]);
	mount(&mut state, entry("persistent"));
	open(&mut state, entry("b").keep_mounted(), OpenMode::Push, no_session);
	assert!(clear_all(&mut state));
	assert!(state.is_empty());
	assert!(order(&state).is_empty());
}

#[test]
fn clear_group_leaves_other_groups_alone() {
	let mut state = opened(&["a"]);
	open(&mut state, OpenEntry::new("nested", "inner").keep_mounted(), OpenMode::Push, no_session);
	assert!(clear_group(&mut state, &GroupId::from("inner")));
	assert_eq!(order(&state), ["a"]);
	assert!(!clear_group(&mut state, &GroupId::from("inner")));
}

#[test]
fn groups_are_isolated() {
	let mut state = opened(&["a"]);
	open(&mut state, OpenEntry::new("n1", "inner"), OpenMode::Push, no_session);
	open(&mut state, OpenEntry::new("n2", "inner"), OpenMode::Switch, no_session);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Open));
	assert_eq!(status(&state, "n1"), Some(OverlayStatus::Hidden));

	open(&mut state, entry("b"), OpenMode::Replace, no_session);
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Closing));
	assert_eq!(status(&state, "n2"), Some(OverlayStatus::Opening));
}

#[test]
fn mount_starts_hidden_outside_the_stack() {
	let mut state = StackState::default();
	assert!(mount(&mut state, entry("drawer")));
	assert!(!mount(&mut state, entry("drawer")));
	assert_eq!(status(&state, "drawer"), Some(OverlayStatus::Hidden));
	assert!(order(&state).is_empty());
	assert!(unmount(&mut state, &id("drawer")));
	assert!(state.is_empty());
}

#[test]
fn unmounting_the_top_restores_the_hidden_overlay_below() {
	let mut state = opened(&["a"]);
	open(&mut state, entry("b"), OpenMode::Switch, no_session);
	assert!(unmount(&mut state, &id("b")));
	assert_eq!(status(&state, "a"), Some(OverlayStatus::Opening));
}

#[test]
fn update_params_replaces_shallowly() {
	let mut state = StackState::default();
	open(&mut state, entry("a").params(json!({"x": 1, "y": 2})), OpenMode::Push, no_session);
	assert!(update_params(&mut state, &id("a"), Some(json!({"x": 3}))));
	assert_eq!(state.record(&id("a")).and_then(|r| r.params.clone()), Some(json!({"x": 3})));
	assert!(!update_params(&mut state, &id("a"), Some(json!({"x": 3}))));
	assert!(update_params(&mut state, &id("a"), None));
}

#[test]
fn every_lifetime_of_an_id_gets_a_new_instance() {
	let mut state = opened(&["a"]);
	let first = state.instance(&id("a"));
	assert!(unmount(&mut state, &id("a")));
	open(&mut state, entry("a"), OpenMode::Push, no_session);
	let second = state.instance(&id("a"));
	assert!(second > first);

	assert!(clear_all(&mut state));
	mount(&mut state, entry("a"));
	let mounted = state.instance(&id("a"));
	assert!(mounted > second);
	open(&mut state, entry("a"), OpenMode::Push, no_session);
	assert!(state.instance(&id("a")) > mounted);
}
