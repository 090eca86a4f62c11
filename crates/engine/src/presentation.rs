//! Read-only derivations used by hosts to mount and composite overlays.

use crate::ids::{GroupId, OverlayId};
use crate::record::OverlayStatus;
use crate::registry::{PROGRESS_HIDDEN, PROGRESS_VISIBLE};
use crate::state::StackState;

/// Ids a host should keep mounted for `group`: stack order (bottom to top)
/// followed by kept-mounted overlays outside the stack.
pub fn render_queue(state: &StackState, group: &GroupId) -> Vec<OverlayId> {
	state.group_statuses(group).into_iter().map(|(id, _)| id).collect()
}

pub fn is_top(state: &StackState, id: &OverlayId) -> bool {
	state
		.record(id)
		.and_then(|r| state.top_of_group(&r.group))
		.is_some_and(|top| &top.id == id)
}

/// Number of visible `scale_background` overlays stacked above `id` in its group.
///
/// Hosts scale an overlay down one step per level so deeper overlays recede.
pub fn scale_depth(state: &StackState, id: &OverlayId) -> usize {
	let Some(group) = state.record(id).map(|r| &r.group) else {
		return 0;
	};
	state
		.group_order(group)
		.skip_while(|current| *current != id)
		.skip(1)
		.filter_map(|above| state.record(above))
		.filter(|r| r.scale_background && r.status != OverlayStatus::Hidden)
		.count()
}

/// Maps progress (`-1` hidden to `0` visible) to backdrop opacity in `[0, 1]`.
pub fn backdrop_opacity(progress: f32) -> f32 {
	(progress - PROGRESS_HIDDEN).clamp(0.0, PROGRESS_VISIBLE - PROGRESS_HIDDEN)
}
