use core_events::{
    CommandGroup, CommandId, CommandPayload, EditorCommand, KeyCode, KeyEvent, KeyModifiers,
    RawCommand,
};

/// Command ids of the `Editor` group.
pub mod editor {
    use core_events::CommandId;

    pub const TYPECHAR: CommandId = CommandId(1);
    pub const BACKSPACE: CommandId = CommandId(2);
    pub const RETURN: CommandId = CommandId(3);
    pub const TAB: CommandId = CommandId(4);
    pub const BACKTAB: CommandId = CommandId(5);
    pub const DELETE: CommandId = CommandId(6);
    pub const LEFT: CommandId = CommandId(7);
    pub const RIGHT: CommandId = CommandId(9);
    pub const UP: CommandId = CommandId(11);
    pub const DOWN: CommandId = CommandId(13);
    pub const HOME: CommandId = CommandId(15);
    pub const END: CommandId = CommandId(17);
    pub const PAGEUP: CommandId = CommandId(26);
    pub const PAGEDOWN: CommandId = CommandId(28);
    pub const CANCEL: CommandId = CommandId(103);
}

/// Command ids of the `Standard` (host-level) group.
pub mod standard {
    use core_events::CommandId;

    pub const COPY: CommandId = CommandId(15);
    pub const CUT: CommandId = CommandId(16);
    pub const PASTE: CommandId = CommandId(26);
    pub const REDO: CommandId = CommandId(29);
    pub const SAVE: CommandId = CommandId(110);
    pub const SELECT_ALL: CommandId = CommandId(31);
    pub const UNDO: CommandId = CommandId(43);
    pub const FIND: CommandId = CommandId(97);
}

/// Map an `Editor` group command id to its logical key code.
///
/// TYPECHAR is handled by the caller since it needs the payload. Returns
/// `None` for ids we do not translate.
pub(crate) fn map_editor_key(id: CommandId) -> Option<(KeyCode, KeyModifiers)> {
    let key = match id {
        editor::BACKSPACE => KeyCode::Backspace,
        editor::RETURN => KeyCode::Enter,
        editor::TAB => KeyCode::Tab,
        editor::BACKTAB => return Some((KeyCode::Tab, KeyModifiers::SHIFT)),
        editor::DELETE => KeyCode::Delete,
        editor::LEFT => KeyCode::Left,
        editor::RIGHT => KeyCode::Right,
        editor::UP => KeyCode::Up,
        editor::DOWN => KeyCode::Down,
        editor::HOME => KeyCode::Home,
        editor::END => KeyCode::End,
        editor::PAGEUP => KeyCode::PageUp,
        editor::PAGEDOWN => KeyCode::PageDown,
        editor::CANCEL => KeyCode::Esc,
        _ => return None,
    };
    Some((key, KeyModifiers::empty()))
}

fn map_standard(id: CommandId) -> Option<EditorCommand> {
    match id {
        standard::UNDO => Some(EditorCommand::Undo),
        standard::REDO => Some(EditorCommand::Redo),
        standard::COPY
        | standard::CUT
        | standard::PASTE
        | standard::SAVE
        | standard::SELECT_ALL
        | standard::FIND => Some(EditorCommand::Host(id)),
        _ => None,
    }
}

/// Pure table conversion of a raw host command. No host state is consulted.
///
/// `mods` is the modifier state at the time of the command; it is merged into
/// the key (a BACKTAB command already implies Shift).
pub fn convert(raw: &RawCommand, mods: KeyModifiers) -> Option<EditorCommand> {
    match raw.group {
        CommandGroup::Standard => map_standard(raw.id),
        CommandGroup::Editor => {
            if raw.id == editor::TYPECHAR {
                return match raw.payload {
                    CommandPayload::Char(c) => {
                        Some(EditorCommand::Key(KeyEvent::new(KeyCode::Char(c), mods)))
                    }
                    CommandPayload::None => None,
                };
            }
            let (code, implied) = map_editor_key(raw.id)?;
            Some(EditorCommand::Key(KeyEvent::new(code, implied | mods)))
        }
        CommandGroup::Other(_) => None,
    }
}

/// The raw command a host delivers for `key`, with the modifier state to
/// pass alongside it. Inverse of [`convert`] for every key it produces.
pub fn raw_for_key(key: KeyEvent) -> Option<(RawCommand, KeyModifiers)> {
    let id = match key.code {
        KeyCode::Char(c) => {
            let raw = RawCommand::with_char(CommandGroup::Editor, editor::TYPECHAR, c);
            return Some((raw, key.mods));
        }
        KeyCode::Tab if key.mods.contains(KeyModifiers::SHIFT) => {
            let raw = RawCommand::new(CommandGroup::Editor, editor::BACKTAB);
            return Some((raw, key.mods.difference(KeyModifiers::SHIFT)));
        }
        KeyCode::Backspace => editor::BACKSPACE,
        KeyCode::Enter => editor::RETURN,
        KeyCode::Tab => editor::TAB,
        KeyCode::Delete => editor::DELETE,
        KeyCode::Left => editor::LEFT,
        KeyCode::Right => editor::RIGHT,
        KeyCode::Up => editor::UP,
        KeyCode::Down => editor::DOWN,
        KeyCode::Home => editor::HOME,
        KeyCode::End => editor::END,
        KeyCode::PageUp => editor::PAGEUP,
        KeyCode::PageDown => editor::PAGEDOWN,
        KeyCode::Esc => editor::CANCEL,
        KeyCode::F(_) => return None,
    };
    Some((RawCommand::new(CommandGroup::Editor, id), key.mods))
}

/// Primitive edits the filter can ask the host to perform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEdit {
    Insert(char),
    Backspace,
    Delete,
    Tab,
    Newline,
}

/// Raw `Editor` command that makes the host perform `edit`.
pub fn to_raw_command(edit: NativeEdit) -> RawCommand {
    match edit {
        NativeEdit::Insert(c) => RawCommand::with_char(CommandGroup::Editor, editor::TYPECHAR, c),
        NativeEdit::Backspace => RawCommand::new(CommandGroup::Editor, editor::BACKSPACE),
        NativeEdit::Delete => RawCommand::new(CommandGroup::Editor, editor::DELETE),
        NativeEdit::Tab => RawCommand::new(CommandGroup::Editor, editor::TAB),
        NativeEdit::Newline => RawCommand::new(CommandGroup::Editor, editor::RETURN),
    }
}
