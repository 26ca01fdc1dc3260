//! KeyEvent normalization: raw host commands to `EditorCommand`s.
//!
//! `convert` is the pure command table. `normalize` adds the host-state gate:
//! nothing is intercepted while the host runs automation (macro playback,
//! wizards) or while incremental search owns the keyboard, and host-level
//! commands are never claimed even when they convert.

mod command_map;

pub use command_map::{NativeEdit, convert, editor, raw_for_key, standard, to_raw_command};

use core_events::{EditorCommand, KeyModifiers, RawCommand};
use tracing::trace;

/// Host state consulted before any command is converted.
pub trait InputGate {
    /// True while the host executes an automation / scripted context.
    fn in_automation(&self) -> bool;
    /// True while an incremental search UI is capturing input.
    fn is_incremental_search_active(&self) -> bool;
}

/// Why a command was left to the host without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    Automation,
    IncrementalSearch,
    HostCommand,
    Unconverted,
}

/// Normalize with the reason for any rejection. See [`normalize`].
pub fn classify<G: InputGate + ?Sized>(
    gate: &G,
    raw: &RawCommand,
    mods: KeyModifiers,
) -> Result<EditorCommand, PassReason> {
    if gate.in_automation() {
        return Err(PassReason::Automation);
    }
    if gate.is_incremental_search_active() {
        return Err(PassReason::IncrementalSearch);
    }
    match convert(raw, mods) {
        Some(EditorCommand::Host(_)) => Err(PassReason::HostCommand),
        Some(cmd) => Ok(cmd),
        None => Err(PassReason::Unconverted),
    }
}

/// Convert a raw host command into an `EditorCommand`, or `None` when the
/// command must go straight to the host.
pub fn normalize<G: InputGate + ?Sized>(
    gate: &G,
    raw: &RawCommand,
    mods: KeyModifiers,
) -> Option<EditorCommand> {
    match classify(gate, raw, mods) {
        Ok(cmd) => Some(cmd),
        Err(reason) => {
            trace!(target: "input.normalize", command = %raw, ?reason, "pass_to_host");
            None
        }
    }
}
