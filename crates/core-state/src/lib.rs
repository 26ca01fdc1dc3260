//! Per-editor-instance session state shared by the filter layers.
//!
//! * `ModeKind`: the modal engine's current mode, as far as arbitration cares.
//! * `UiSurfaces`: which host IntelliSense-style popups are currently showing.
//! * `DiscardedKey`: the one piece of state that crosses the query/execute
//!   boundary (see its docs for the lifecycle contract).

use core_events::KeyEvent;
use tracing::trace;

/// Engine mode as seen by the arbitration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeKind {
    #[default]
    Normal,
    Insert,
    Replace,
    VisualCharacter,
    VisualLine,
    VisualBlock,
    Command,
    /// The host is editing text on the engine's behalf (snippets, refactor
    /// fields). Escape returns to Normal mode.
    ExternalEdit,
    /// Engine switched off for this buffer; it processes nothing.
    Disabled,
}

impl ModeKind {
    /// Insert and Replace: modes where typed characters become text.
    pub fn is_insert_like(self) -> bool {
        matches!(self, ModeKind::Insert | ModeKind::Replace)
    }

    pub fn is_visual(self) -> bool {
        matches!(
            self,
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock
        )
    }
}

bitflags::bitflags! {
    /// Host popups that want navigation keys while visible.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct UiSurfaces: u8 {
        const COMPLETION     = 0b0000_0001;
        const QUICK_INFO     = 0b0000_0010;
        const SIGNATURE_HELP = 0b0000_0100;
        const SMART_TAG      = 0b0000_1000;
    }
}

/// Single-slot record of a key the filter already handled privately during a
/// query call and must therefore swallow if the matching execute call arrives.
///
/// Lifecycle contract:
/// * set only by the query-phase quirk sub-protocol, after the engine handled
///   the key;
/// * cleared at the start of every query whose command normalizes;
/// * cleared unconditionally at the end of every execute call, whichever path
///   it took.
///
/// The slot therefore never outlives one query/execute round trip, even when
/// the host interleaves calls for different keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscardedKey {
    slot: Option<KeyEvent>,
}

impl DiscardedKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: KeyEvent) {
        trace!(target: "filter.discard", key = %key, "set");
        self.slot = Some(key);
    }

    /// Exact match against the recorded key; does not modify the slot.
    pub fn matches(&self, key: KeyEvent) -> bool {
        self.slot == Some(key)
    }

    pub fn clear(&mut self) {
        if let Some(key) = self.slot.take() {
            trace!(target: "filter.discard", key = %key, "clear");
        }
    }

    pub fn get(&self) -> Option<KeyEvent> {
        self.slot
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
