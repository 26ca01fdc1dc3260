//! Position-keyed adornment cache.
//!
//! Entries are kept sorted strictly ascending by character offset with unique
//! positions, so lookups are a binary search and edits are a contiguous drain
//! followed by a linear shift of the tail. The cache is tied to one document
//! snapshot; entries never describe any other snapshot.

use core_events::{SnapshotId, TextChange, TextChangedEvent};
use tracing::{debug, trace, warn};

/// One cached element at a character offset of the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdornmentEntry<E> {
    pub position: usize,
    pub element: E,
}

#[derive(Debug, Clone)]
pub struct AdornmentCache<E> {
    entries: Vec<AdornmentEntry<E>>,
    snapshot: Option<SnapshotId>,
}

impl<E> Default for AdornmentCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> AdornmentCache<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            snapshot: None,
        }
    }

    /// Snapshot the entries describe; `None` until first bound.
    pub fn snapshot(&self) -> Option<SnapshotId> {
        self.snapshot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.position)
    }

    pub fn entries(&self) -> &[AdornmentEntry<E>] {
        &self.entries
    }

    /// `Ok(index)` of the entry at `position`, or `Err(index)` where one
    /// would be inserted to keep the order.
    pub fn find_index(&self, position: usize) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&position, |e| e.position)
    }

    pub fn get(&self, position: usize) -> Option<&E> {
        self.find_index(position)
            .ok()
            .map(|i| &self.entries[i].element)
    }

    /// Tie the cache to `snapshot`, dropping entries that belong to another.
    pub fn bind(&mut self, snapshot: SnapshotId) {
        if self.snapshot == Some(snapshot) {
            return;
        }
        if !self.entries.is_empty() {
            debug!(
                target: "render.adornment",
                from = ?self.snapshot,
                to = ?snapshot,
                dropped = self.entries.len(),
                "rebind_clears"
            );
            self.entries.clear();
        }
        self.snapshot = Some(snapshot);
    }

    /// Cached element at `position`, creating it with `make` on a miss.
    pub fn get_or_insert_with(&mut self, position: usize, make: impl FnOnce() -> E) -> &E {
        let idx = match self.find_index(position) {
            Ok(idx) => idx,
            Err(idx) => {
                trace!(target: "render.adornment", position, "create");
                self.entries.insert(
                    idx,
                    AdornmentEntry {
                        position,
                        element: make(),
                    },
                );
                idx
            }
        };
        &self.entries[idx].element
    }

    /// Drop every entry and forget the snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.snapshot = None;
    }

    /// Carry the entries from `event.previous` to `event.snapshot`.
    ///
    /// Changes are applied in the order given. Each is expressed in
    /// `previous` coordinates, so the deltas of the changes already applied
    /// are added to its bounds first. Entries inside a replaced span are
    /// removed, entries at or after its end move by its delta.
    ///
    /// A cache bound to any snapshot other than `event.previous` missed an
    /// edit and is cleared instead.
    pub fn apply_changes(&mut self, event: &TextChangedEvent) {
        if self.snapshot != Some(event.previous) {
            if !self.entries.is_empty() {
                debug!(
                    target: "render.adornment",
                    cached = ?self.snapshot,
                    expected = ?event.previous,
                    "snapshot_mismatch_clears"
                );
                self.entries.clear();
            }
            self.snapshot = Some(event.snapshot);
            return;
        }
        self.snapshot = Some(event.snapshot);
        let mut offset: isize = 0;
        for change in &event.changes {
            if !self.apply_one(change, offset) {
                warn!(target: "render.adornment", ?change, offset, "malformed_change_clears");
                self.entries.clear();
                return;
            }
            offset += change.delta;
        }
    }

    fn apply_one(&mut self, change: &TextChange, offset: isize) -> bool {
        let (Some(start), Some(end)) = (
            change.old_position.checked_add_signed(offset),
            change.old_end.checked_add_signed(offset),
        ) else {
            return false;
        };
        if end < start || change.delta < -(change.old_len() as isize) {
            return false;
        }
        let lo = self.find_index(start).unwrap_or_else(|i| i);
        let hi = self.find_index(end).unwrap_or_else(|i| i);
        let removed = self.entries.drain(lo..hi).count();
        if change.delta != 0 {
            for entry in &mut self.entries[lo..] {
                // end <= position and delta >= start - end, so this stays >= start.
                entry.position = entry.position.wrapping_add_signed(change.delta);
            }
        }
        trace!(
            target: "render.adornment",
            start,
            end,
            delta = change.delta,
            removed,
            shifted = self.entries.len() - lo,
            "apply_change"
        );
        true
    }
}
