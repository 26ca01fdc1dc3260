//! Immutable document snapshots as seen by adornment sources.

use core_events::{SnapshotId, TextChange, TextChangedEvent};
use ropey::Rope;

/// Read-only view of one document version. Offsets are in characters.
pub trait TextSnapshot {
    fn id(&self) -> SnapshotId;
    fn len_chars(&self) -> usize;
    fn char_at(&self, idx: usize) -> Option<char>;
}

/// Snapshot backed by a `ropey::Rope`. Clones share the rope's storage.
#[derive(Debug, Clone)]
pub struct RopeSnapshot {
    id: SnapshotId,
    rope: Rope,
}

impl RopeSnapshot {
    pub fn new(id: SnapshotId, text: &str) -> Self {
        Self {
            id,
            rope: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace `[start, end)` with `replacement`, producing the next snapshot
    /// and the notification a host would send for it. Out-of-range bounds are
    /// clamped to the document.
    pub fn edit(
        &self,
        next: SnapshotId,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> (RopeSnapshot, TextChangedEvent) {
        let len = self.rope.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);
        let mut rope = self.rope.clone();
        rope.remove(start..end);
        rope.insert(start, replacement);
        let change = TextChange::replace(start, end, replacement.chars().count());
        let event = TextChangedEvent {
            previous: self.id,
            snapshot: next,
            changes: vec![change],
        };
        (RopeSnapshot { id: next, rope }, event)
    }
}

impl TextSnapshot for RopeSnapshot {
    fn id(&self) -> SnapshotId {
        self.id
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        self.rope.get_char(idx)
    }
}
