//! Core event types for keygate.
//!
//! Everything the filter layers exchange lives here: logical keystrokes
//! (`KeyEvent`), the normalized `EditorCommand`, the raw host command triple
//! the host hands us, and the notification payloads consumed by the adornment
//! cache (document edits, display settings).
//!
//! All hosts call in on a single UI thread, so nothing in this crate is `Send`
//! by requirement; see `hub` for the single-threaded subscription primitive.

use std::fmt;

pub mod hub;
mod notation;

pub use hub::{EventHub, Registration, Subscription};
pub use notation::{KeyParseError, parse_keys};

// -------------------------------------------------------------------------------------------------
// Keys
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// KeyCode enumerates normalized logical key representations consumed by higher layers.
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

/// A logical keystroke. Two events are equal iff code and modifiers match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Unmodified key.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CTRL)
    }

    pub const ESCAPE: KeyEvent = KeyEvent::plain(KeyCode::Esc);
    pub const ENTER: KeyEvent = KeyEvent::plain(KeyCode::Enter);
    pub const BACKSPACE: KeyEvent = KeyEvent::plain(KeyCode::Backspace);
    pub const TAB: KeyEvent = KeyEvent::plain(KeyCode::Tab);

    /// True for keys whose natural target is an IntelliSense-style popup when
    /// one is showing: arrows, Tab, Backspace, Enter. Shift is tolerated
    /// (`<S-Tab>` walks a completion list backwards); Ctrl/Alt chords are not.
    pub fn is_navigation_or_edit(&self) -> bool {
        let popup_code = matches!(
            self.code,
            KeyCode::Up
                | KeyCode::Down
                | KeyCode::Left
                | KeyCode::Right
                | KeyCode::Tab
                | KeyCode::Backspace
                | KeyCode::Enter
        );
        popup_code && (self.mods - KeyModifiers::SHIFT).is_empty()
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        notation::write_key(f, self)
    }
}

// -------------------------------------------------------------------------------------------------
// Commands
// -------------------------------------------------------------------------------------------------

/// Host command identifier within a [`CommandGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub u32);

/// Command namespace as reported by the host dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    /// Host-level commands (menus, clipboard, undo/redo).
    Standard,
    /// Textual editing commands (typed characters, cursor keys).
    Editor,
    /// Commands from any other namespace; never converted.
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandPayload {
    #[default]
    None,
    /// Character carried by a TYPECHAR command.
    Char(char),
}

/// Raw command exactly as the host's query / execute callbacks deliver it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawCommand {
    pub group: CommandGroup,
    pub id: CommandId,
    pub payload: CommandPayload,
}

impl RawCommand {
    pub const fn new(group: CommandGroup, id: CommandId) -> Self {
        Self {
            group,
            id,
            payload: CommandPayload::None,
        }
    }

    pub const fn with_char(group: CommandGroup, id: CommandId, c: char) -> Self {
        Self {
            group,
            id,
            payload: CommandPayload::Char(c),
        }
    }
}

impl fmt::Display for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.group, self.id.0)?;
        if let CommandPayload::Char(c) = self.payload {
            write!(f, "({c:?})")?;
        }
        Ok(())
    }
}

/// Opaque execution options forwarded untouched to the next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions(pub u32);

/// Normalized command produced once per raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    Key(KeyEvent),
    Undo,
    Redo,
    /// A host-level command (paste, save, ...). The engine never intercepts these.
    Host(CommandId),
}

impl EditorCommand {
    pub fn key(&self) -> Option<KeyEvent> {
        match self {
            EditorCommand::Key(k) => Some(*k),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Document / settings notifications
// -------------------------------------------------------------------------------------------------

/// Identity of one immutable document snapshot. Compared by identity only,
/// never by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(pub u64);

/// One text replacement in old-snapshot coordinates: `[old_position, old_end)`
/// was replaced by `old_end - old_position + delta` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    pub old_position: usize,
    pub old_end: usize,
    pub delta: isize,
}

impl TextChange {
    pub fn insert(at: usize, len: usize) -> Self {
        Self {
            old_position: at,
            old_end: at,
            delta: len as isize,
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            old_position: start,
            old_end: end,
            delta: -((end - start) as isize),
        }
    }

    pub fn replace(start: usize, end: usize, new_len: usize) -> Self {
        Self {
            old_position: start,
            old_end: end,
            delta: new_len as isize - (end - start) as isize,
        }
    }

    pub fn old_len(&self) -> usize {
        self.old_end - self.old_position
    }
}

/// Document edit notification. `changes` are ascending and non-overlapping in
/// the coordinates of `previous`; `snapshot` is the snapshot they produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChangedEvent {
    pub previous: SnapshotId,
    pub snapshot: SnapshotId,
    pub changes: Vec<TextChange>,
}

/// Editor display setting / format notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    /// The "display control characters" option was set (not necessarily changed).
    ControlCharsDisplay(bool),
    /// Fonts / colors changed; every pre-measured element is stale.
    FormatChanged,
}
