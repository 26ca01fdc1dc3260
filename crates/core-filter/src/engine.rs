use core_events::KeyEvent;
use core_keymap::{MappingSource, RemapMode};
use core_state::ModeKind;

use crate::native::NativeEditSink;

/// The modal command engine as consumed by the filter.
///
/// Mapping queries come from the [`MappingSource`] supertrait.
pub trait ModalEngine: MappingSource {
    fn mode(&self) -> ModeKind;

    /// Capability check: would `process` do anything with this key at all?
    fn can_process(&self, key: KeyEvent) -> bool;

    /// Run the key through the engine. Returns whether it was handled.
    ///
    /// `native` lets insert-like modes hand primitive edits back to the host
    /// instead of editing the buffer directly.
    fn process(&mut self, key: KeyEvent, native: &mut dyn NativeEditSink) -> bool;

    fn undo(&mut self, count: usize);
    fn redo(&mut self, count: usize);

    /// Whether the engine's own word-completion session is open.
    fn has_word_completion(&self) -> bool {
        false
    }

    fn dismiss_word_completion(&mut self) {}
}

/// Mapping table consulted in `mode`.
pub fn remap_mode(mode: ModeKind) -> RemapMode {
    match mode {
        ModeKind::Insert | ModeKind::Replace | ModeKind::ExternalEdit => RemapMode::Insert,
        ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock => {
            RemapMode::Visual
        }
        ModeKind::Command => RemapMode::Command,
        ModeKind::Normal | ModeKind::Disabled => RemapMode::Normal,
    }
}
