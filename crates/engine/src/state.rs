//! Immutable-by-convention snapshot of every tracked overlay.

use rustc_hash::FxHashMap;

use crate::ids::{GroupId, OverlayId};
use crate::record::{OverlayRecord, OverlayStatus};

/// Records keyed by id plus the visual stack order across all groups.
///
/// # Invariants
///
/// - `order` holds each id at most once and only ids present in `records`.
/// - Mounted-but-inactive overlays live in `records` without an `order` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackState {
	pub(crate) records: FxHashMap<OverlayId, OverlayRecord>,
	pub(crate) order: Vec<OverlayId>,
	/// Last instance number handed out; never reset, not even by `clear_all`.
	pub(crate) instances: u64,
}

impl StackState {
	pub fn record(&self, id: &OverlayId) -> Option<&OverlayRecord> {
		self.records.get(id)
	}

	pub fn status(&self, id: &OverlayId) -> Option<OverlayStatus> {
		self.records.get(id).map(|r| r.status)
	}

	/// Instance number of the record currently tracked under `id`.
	pub fn instance(&self, id: &OverlayId) -> Option<u64> {
		self.records.get(id).map(|r| r.instance)
	}

	pub fn contains(&self, id: &OverlayId) -> bool {
		self.records.contains_key(id)
	}

	/// Whole stack order, bottom to top, across all groups.
	pub fn order(&self) -> &[OverlayId] {
		&self.order
	}

	pub fn records(&self) -> impl Iterator<Item = &OverlayRecord> {
		self.records.values()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn in_stack(&self, id: &OverlayId) -> bool {
		self.order.contains(id)
	}

	/// Stack order of one group, bottom to top.
	pub fn group_order<'a>(&'a self, group: &'a GroupId) -> impl DoubleEndedIterator<Item = &'a OverlayId> + 'a {
		self.order
			.iter()
			.filter(move |id| self.records.get(*id).is_some_and(|r| &r.group == group))
	}

	pub fn top_of_group(&self, group: &GroupId) -> Option<&OverlayRecord> {
		self.group_order(group).next_back().and_then(|id| self.records.get(id))
	}

	/// The record immediately below `id` within its own group's stack order.
	pub fn below(&self, id: &OverlayId) -> Option<&OverlayRecord> {
		let group = &self.records.get(id)?.group;
		let mut previous = None;
		for current in self.group_order(group) {
			if current == id {
				return previous.and_then(|p| self.records.get(p));
			}
			previous = Some(current);
		}
		None
	}

	/// Records of a group that are tracked but not in the stack, sorted by id.
	pub fn mounted_inactive<'a>(&'a self, group: &GroupId) -> Vec<&'a OverlayRecord> {
		let mut dormant: Vec<_> = self
			.records
			.values()
			.filter(|r| &r.group == group && !self.order.contains(&r.id))
			.collect();
		dormant.sort_by(|a, b| a.id.cmp(&b.id));
		dormant
	}

	/// `(id, status)` for a group: stack order first, then mounted-inactive records.
	pub fn group_statuses(&self, group: &GroupId) -> Vec<(OverlayId, OverlayStatus)> {
		self.group_order(group)
			.filter_map(|id| self.records.get(id))
			.chain(self.mounted_inactive(group))
			.map(|r| (r.id.clone(), r.status))
			.collect()
	}

	/// A kept-mounted record outside the stack; the one case where `open` may reuse an id.
	pub fn is_dormant(&self, id: &OverlayId) -> bool {
		self.records
			.get(id)
			.is_some_and(|r| r.keep_mounted && r.status == OverlayStatus::Hidden && !self.order.contains(id))
	}
}
