//! Bounded linear undo/redo over full graph snapshots.
//!
//! ```text
//!  record(s3) with cursor at s1:
//!
//!  [s0, s1, s2]      truncate future      [s0, s1]      append      [s0, s1, s3]
//!       ^                                      ^                             ^
//! ```
//!
//! The store always holds at least one snapshot. Undo and redo only move the cursor;
//! only [`HistoryStore::record`] and [`HistoryStore::reset`] add entries.

use std::collections::VecDeque;

use log::trace;

use super::state::GraphState;
use crate::config::DEFAULT_HISTORY_LIMIT;

/// Immutable copy of everything needed to restore a graph.
///
/// Snapshots own their data; later edits to the live graph cannot reach them.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphSnapshot(GraphState);

impl GraphSnapshot {
	pub fn capture(state: &GraphState) -> Self {
		Self(state.clone())
	}

	pub fn state(&self) -> &GraphState {
		&self.0
	}

	/// A fresh, independently owned copy of the captured state.
	pub fn restore(&self) -> GraphState {
		self.0.clone()
	}
}

/// Snapshot history with a cursor at the current state.
#[derive(Clone, Debug)]
pub struct HistoryStore {
	entries: VecDeque<GraphSnapshot>,
	cursor: usize,
	limit: usize,
}

impl HistoryStore {
	/// Starts a history holding `initial` only. A `limit` of zero is treated as one.
	pub fn new(initial: &GraphState, limit: usize) -> Self {
		Self {
			entries: VecDeque::from([GraphSnapshot::capture(initial)]),
			cursor: 0,
			limit: limit.max(1),
		}
	}

	pub fn with_default_limit(initial: &GraphState) -> Self {
		Self::new(initial, DEFAULT_HISTORY_LIMIT)
	}

	/// Records the post-mutation `state`, discarding any redo future.
	///
	/// When the bound is exceeded the oldest snapshot is dropped; the cursor keeps
	/// pointing at the entry just recorded.
	pub fn record(&mut self, state: &GraphState) {
		self.entries.truncate(self.cursor + 1);
		self.entries.push_back(GraphSnapshot::capture(state));
		while self.entries.len() > self.limit {
			self.entries.pop_front();
		}
		self.cursor = self.entries.len() - 1;
		trace!("history record: {} entries", self.entries.len());
	}

	/// Steps back one snapshot. `None` at the oldest entry.
	pub fn undo(&mut self) -> Option<&GraphSnapshot> {
		if self.cursor == 0 {
			return None;
		}
		self.cursor -= 1;
		trace!("history undo -> {}", self.cursor);
		self.entries.get(self.cursor)
	}

	/// Steps forward one snapshot. `None` at the newest entry.
	pub fn redo(&mut self) -> Option<&GraphSnapshot> {
		if self.cursor + 1 >= self.entries.len() {
			return None;
		}
		self.cursor += 1;
		trace!("history redo -> {}", self.cursor);
		self.entries.get(self.cursor)
	}

	/// Replaces the whole history with `state`. Used when the active graph is swapped out.
	pub fn reset(&mut self, state: &GraphState) {
		self.entries.clear();
		self.entries.push_back(GraphSnapshot::capture(state));
		self.cursor = 0;
	}

	pub fn current(&self) -> &GraphSnapshot {
		&self.entries[self.cursor]
	}

	pub fn can_undo(&self) -> bool {
		self.cursor > 0
	}

	pub fn can_redo(&self) -> bool {
		self.cursor + 1 < self.entries.len()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn limit(&self) -> usize {
		self.limit
	}
}
