//! Cooperating-extension quirk sub-protocol.
//!
//! Some extensions sit ahead of the filter in the host chain for certain
//! command classes: their execute runs first and may never call onward. For
//! the keys listed in the quirk table the engine therefore processes the key
//! during the *query* call. The caller records the key as discarded so the
//! later execute call is a no-op.
//!
//! * Escape (insert-like or external-edit mode): the extension may need the
//!   same keystroke to close its own popup, so the default is to cooperate.
//! * Backspace / Enter (outside insert-like modes): the extension's paren
//!   matching and doc-comment formatting must not fire on top of the engine
//!   command, so the default is exclusive.
//!
//! A key the engine cannot process is never run eagerly, whatever its class.

use core_events::KeyEvent;
use core_state::ModeKind;
use tracing::debug;

use crate::engine::ModalEngine;
use crate::native::NativeEditSink;
use crate::policy::QueryClass;
use crate::{QuirkAction, QuirkKeyClass, QuirkTable};

/// Key class with special extension handling in `mode`, if any.
pub fn key_class(mode: ModeKind, key: KeyEvent) -> Option<QuirkKeyClass> {
    if key == KeyEvent::ESCAPE {
        return (mode.is_insert_like() || mode == ModeKind::ExternalEdit)
            .then_some(QuirkKeyClass::Escape);
    }
    if mode.is_insert_like() {
        return None;
    }
    if key == KeyEvent::ENTER {
        Some(QuirkKeyClass::Enter)
    } else if key == KeyEvent::BACKSPACE {
        Some(QuirkKeyClass::Backspace)
    } else {
        None
    }
}

/// Run the engine on `key` during the query call when the quirk table asks
/// for it. Returns the query answer when the engine handled the key.
pub fn eager_query<E>(
    table: &QuirkTable,
    engine: &mut E,
    native: &mut dyn NativeEditSink,
    key: KeyEvent,
) -> Option<QueryClass>
where
    E: ModalEngine + ?Sized,
{
    if !table.extension_installed {
        return None;
    }
    let class = key_class(engine.mode(), key)?;
    let answer = match table.action(class) {
        QuirkAction::Ignore => return None,
        QuirkAction::Cooperate => QueryClass::Enable,
        QuirkAction::Exclusive => QueryClass::Disable,
    };
    if !engine.can_process(key) {
        return None;
    }
    let mode_before = engine.mode();
    let handled = engine.process(key, native);
    debug!(
        target: "filter.quirk",
        key = %key,
        ?class,
        ?mode_before,
        mode_after = ?engine.mode(),
        handled,
        "eager_process"
    );
    handled.then_some(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_class_only_in_insert_or_external_edit() {
        assert_eq!(
            key_class(ModeKind::Insert, KeyEvent::ESCAPE),
            Some(QuirkKeyClass::Escape)
        );
        assert_eq!(
            key_class(ModeKind::Replace, KeyEvent::ESCAPE),
            Some(QuirkKeyClass::Escape)
        );
        assert_eq!(
            key_class(ModeKind::ExternalEdit, KeyEvent::ESCAPE),
            Some(QuirkKeyClass::Escape)
        );
        assert_eq!(key_class(ModeKind::Normal, KeyEvent::ESCAPE), None);
    }

    #[test]
    fn backspace_enter_only_outside_insert() {
        assert_eq!(
            key_class(ModeKind::Normal, KeyEvent::ENTER),
            Some(QuirkKeyClass::Enter)
        );
        assert_eq!(
            key_class(ModeKind::VisualLine, KeyEvent::BACKSPACE),
            Some(QuirkKeyClass::Backspace)
        );
        assert_eq!(key_class(ModeKind::Insert, KeyEvent::ENTER), None);
        assert_eq!(key_class(ModeKind::Replace, KeyEvent::BACKSPACE), None);
        assert_eq!(key_class(ModeKind::Normal, KeyEvent::char('x')), None);
    }
}
