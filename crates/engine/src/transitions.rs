//! Pure transition functions over [`StackState`].
//!
//! Every function returns `true` when it changed the state and leaves the state
//! untouched when it returns `false`. Unknown ids and disallowed transitions
//! are no-ops, never errors: overlay lifecycles race with animation callbacks
//! that may arrive late or twice.
//!
//! ```text
//! (absent) --open---------------------> opening
//! opening  --mark_open-----------------> open
//! open     --start_closing-------------> closing
//! opening  --start_closing-------------> closing
//! closing  --finish_closing------------> (absent) | hidden (keep_mounted)
//! hidden   --overlay above leaves-------> opening
//! hidden   --open (dormant reactivation)-> opening
//! *        --clear_group / clear_all---> (absent)
//! ```

use crate::ids::{GroupId, OverlayId};
use crate::record::{OpenEntry, OpenMode, OverlayRecord, OverlayStatus, Params};
use crate::state::StackState;

/// Opens `entry` on top of its group.
///
/// `next_session` is consulted only when the open is accepted and the overlay
/// uses a portal, so rejected opens never burn a portal session.
pub fn open(state: &mut StackState, entry: OpenEntry, mode: OpenMode, next_session: impl FnOnce(&OverlayId) -> u64) -> bool {
	if state.contains(&entry.id) && !state.is_dormant(&entry.id) {
		return false;
	}

	if let Some(top_id) = state.top_of_group(&entry.group).filter(|top| top.status.is_active()).map(|top| top.id.clone())
		&& let Some(top) = state.records.get_mut(&top_id)
	{
		match mode {
			OpenMode::Push => {}
			OpenMode::Switch => top.status = OverlayStatus::Hidden,
			OpenMode::Replace => top.status = OverlayStatus::Closing,
		}
	}

	let id = entry.id.clone();
	let mut record = match state.records.remove(&id) {
		Some(dormant) => reactivate(dormant, entry),
		None => entry.into_record(OverlayStatus::Opening),
	};
	if record.use_portal {
		record.portal_session = next_session(&id);
	}
	record.instance = next_instance(state);
	state.records.insert(id.clone(), record);
	state.order.push(id);
	true
}

fn reactivate(previous: OverlayRecord, entry: OpenEntry) -> OverlayRecord {
	OverlayRecord {
		id: previous.id,
		group: entry.group,
		content: entry.content.or(previous.content),
		status: OverlayStatus::Opening,
		use_portal: previous.use_portal || entry.use_portal,
		keep_mounted: true,
		params: entry.params.or(previous.params),
		scale_background: entry.scale_background.unwrap_or(previous.scale_background),
		portal_session: previous.portal_session,
		instance: previous.instance,
		prevent_dismiss: previous.prevent_dismiss || entry.prevent_dismiss,
	}
}

fn next_instance(state: &mut StackState) -> u64 {
	state.instances += 1;
	state.instances
}

/// `opening -> open`.
pub fn mark_open(state: &mut StackState, id: &OverlayId) -> bool {
	match state.records.get_mut(id) {
		Some(record) if record.status == OverlayStatus::Opening => {
			record.status = OverlayStatus::Open;
			true
		}
		_ => false,
	}
}

/// `opening | open -> closing`, restoring a hidden overlay directly below.
///
/// Hidden overlays are not shown, so closing one has no meaning and is ignored.
pub fn start_closing(state: &mut StackState, id: &OverlayId) -> bool {
	match state.records.get(id) {
		Some(record) if record.status.is_active() => {}
		_ => return false,
	}

	let restore = state.below(id).filter(|r| r.status == OverlayStatus::Hidden).map(|r| r.id.clone());
	if let Some(record) = state.records.get_mut(id) {
		record.status = OverlayStatus::Closing;
	}
	if let Some(below) = restore.and_then(|below| state.records.get_mut(&below)) {
		below.status = OverlayStatus::Opening;
	}
	true
}

/// Removes `id` from the stack, destroying it unless kept mounted, and
/// restores the new top of its group when that top is hidden.
pub fn finish_closing(state: &mut StackState, id: &OverlayId) -> bool {
	let Some(record) = state.records.get_mut(id) else {
		return false;
	};
	let group = record.group.clone();
	if record.keep_mounted {
		if record.status == OverlayStatus::Hidden && !state.order.contains(id) {
			return false;
		}
		record.status = OverlayStatus::Hidden;
	} else {
		state.records.remove(id);
	}
	state.order.retain(|entry| entry != id);
	restore_top(state, &group);
	true
}

fn restore_top(state: &mut StackState, group: &GroupId) {
	let Some(top) = state.top_of_group(group).filter(|r| r.status == OverlayStatus::Hidden).map(|r| r.id.clone()) else {
		return;
	};
	if let Some(record) = state.records.get_mut(&top) {
		record.status = OverlayStatus::Opening;
	}
}

/// Replaces `params` on an existing record.
pub fn update_params(state: &mut StackState, id: &OverlayId, params: Option<Params>) -> bool {
	match state.records.get_mut(id) {
		Some(record) if record.params != params => {
			record.params = params;
			true
		}
		_ => false,
	}
}

pub fn set_prevent_dismiss(state: &mut StackState, id: &OverlayId, prevent: bool) -> bool {
	match state.records.get_mut(id) {
		Some(record) if record.prevent_dismiss != prevent => {
			record.prevent_dismiss = prevent;
			true
		}
		_ => false,
	}
}

/// Drops every record of `group`, kept-mounted ones included.
pub fn clear_group(state: &mut StackState, group: &GroupId) -> bool {
	let before = state.records.len();
	state.records.retain(|_, r| &r.group != group);
	if state.records.len() == before {
		return false;
	}
	let records = &state.records;
	state.order.retain(|id| records.contains_key(id));
	true
}

pub fn clear_all(state: &mut StackState) -> bool {
	if state.records.is_empty() && state.order.is_empty() {
		return false;
	}
	state.records.clear();
	state.order.clear();
	true
}

/// Registers a kept-mounted overlay outside the stack, starting `hidden`.
pub fn mount(state: &mut StackState, entry: OpenEntry) -> bool {
	if state.contains(&entry.id) {
		return false;
	}
	let mut record = entry.into_record(OverlayStatus::Hidden);
	record.keep_mounted = true;
	record.instance = next_instance(state);
	state.records.insert(record.id.clone(), record);
	true
}

pub fn unmount(state: &mut StackState, id: &OverlayId) -> bool {
	let Some(group) = state.records.get(id).map(|r| r.group.clone()) else {
		return false;
	};
	let was_top = state.top_of_group(&group).is_some_and(|top| top.id == *id);
	state.records.remove(id);
	state.order.retain(|entry| entry != id);
	if was_top {
		restore_top(state, &group);
	}
	true
}

#[cfg(test)]
mod tests;
