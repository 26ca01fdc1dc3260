//! Simulated modal engine and host for trace replay.
//!
//! The engine knows two real modes: Normal (`i`/`a` enter insert, other keys
//! count as commands) and Insert (`<Esc>` leaves, `<C-n>` opens word
//! completion, text goes back to the host as native edits, caret movement is
//! left to the host). The host keeps a rope-backed document and raises an
//! edit notification for every change.

use core_events::{
    CommandGroup, CommandPayload, EventHub, ExecOptions, KeyCode, KeyEvent, KeyModifiers,
    RawCommand, SnapshotId, TextChangedEvent,
};
use core_filter::{
    CommandState, ExecStatus, Host, ModalEngine, NativeEdit, NativeEditSink, remap_mode,
};
use core_input::{InputGate, editor, standard};
use core_keymap::{KeyMap, MappingResult, MappingSource};
use core_render::{RopeSnapshot, TextSnapshot};
use core_state::{ModeKind, UiSurfaces};
use tracing::{debug, trace};

const PASTE_TEXT: &str = "<clip>";

/// What the engine did with one key, for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    EnterInsert,
    LeaveInsert,
    Command(KeyEvent),
    NativeEdit(NativeEdit, bool),
    Pending(KeyEvent),
    WordCompletion,
    Undo(usize),
    Redo(usize),
}

pub struct SimEngine {
    mode: ModeKind,
    keymap: KeyMap,
    buffered: Vec<KeyEvent>,
    word_completion: bool,
    pub actions: Vec<EngineAction>,
}

impl SimEngine {
    pub fn new(mode: ModeKind, keymap: KeyMap, word_completion: bool) -> Self {
        Self {
            mode,
            keymap,
            buffered: Vec::new(),
            word_completion,
            actions: Vec::new(),
        }
    }

    pub fn take_actions(&mut self) -> Vec<EngineAction> {
        std::mem::take(&mut self.actions)
    }

    fn run_key(&mut self, key: KeyEvent, native: &mut dyn NativeEditSink) -> bool {
        if self.mode.is_insert_like() {
            self.run_insert_key(key, native)
        } else {
            self.run_normal_key(key)
        }
    }

    // Caret movement in insert mode stays with the host.
    fn run_insert_key(&mut self, key: KeyEvent, native: &mut dyn NativeEditSink) -> bool {
        if key == KeyEvent::ESCAPE || key == KeyEvent::ctrl('[') {
            self.mode = ModeKind::Normal;
            self.word_completion = false;
            self.actions.push(EngineAction::LeaveInsert);
            return true;
        }
        if key == KeyEvent::ctrl('n') || key == KeyEvent::ctrl('p') {
            self.word_completion = true;
            self.actions.push(EngineAction::WordCompletion);
            return true;
        }
        let edit = match key.code {
            KeyCode::Char(c) if !key.mods.contains(KeyModifiers::CTRL) => NativeEdit::Insert(c),
            KeyCode::Backspace => NativeEdit::Backspace,
            KeyCode::Delete => NativeEdit::Delete,
            KeyCode::Tab => NativeEdit::Tab,
            KeyCode::Enter => NativeEdit::Newline,
            KeyCode::Char(_) => {
                self.actions.push(EngineAction::Command(key));
                return true;
            }
            _ => return false,
        };
        let done = native.try_native_edit(edit);
        self.actions.push(EngineAction::NativeEdit(edit, done));
        true
    }

    fn run_normal_key(&mut self, key: KeyEvent) -> bool {
        if self.mode == ModeKind::Normal && (key == KeyEvent::char('i') || key == KeyEvent::char('a'))
        {
            self.mode = ModeKind::Insert;
            self.actions.push(EngineAction::EnterInsert);
            return true;
        }
        if key == KeyEvent::ESCAPE && self.mode.is_visual() {
            self.mode = ModeKind::Normal;
        }
        self.actions.push(EngineAction::Command(key));
        true
    }
}

impl MappingSource for SimEngine {
    fn key_input_mapping(&self, key: KeyEvent) -> MappingResult {
        let mut input = self.buffered.clone();
        input.push(key);
        self.keymap.resolve(remap_mode(self.mode), &input)
    }

    fn buffered_key_inputs(&self) -> &[KeyEvent] {
        &self.buffered
    }
}

impl ModalEngine for SimEngine {
    fn mode(&self) -> ModeKind {
        self.mode
    }

    fn can_process(&self, key: KeyEvent) -> bool {
        self.mode != ModeKind::Disabled && !key.mods.contains(KeyModifiers::ALT)
    }

    fn process(&mut self, key: KeyEvent, native: &mut dyn NativeEditSink) -> bool {
        if !self.can_process(key) {
            return false;
        }
        match self.key_input_mapping(key) {
            MappingResult::NeedsMoreInput => {
                self.buffered.push(key);
                self.actions.push(EngineAction::Pending(key));
                true
            }
            MappingResult::Mapped(keys) => {
                self.buffered.clear();
                let mut handled = false;
                for k in keys {
                    handled |= self.run_key(k, native);
                }
                handled
            }
            MappingResult::NoMapping => {
                let mut replay = std::mem::take(&mut self.buffered);
                replay.push(key);
                let mut handled = false;
                for k in replay {
                    handled |= self.run_key(k, native);
                }
                handled
            }
            MappingResult::Recursive => {
                debug!(target: "sim.engine", key = %key, "recursive_mapping_dropped");
                self.buffered.clear();
                true
            }
        }
    }

    fn undo(&mut self, count: usize) {
        self.actions.push(EngineAction::Undo(count));
    }

    fn redo(&mut self, count: usize) {
        self.actions.push(EngineAction::Redo(count));
    }

    fn has_word_completion(&self) -> bool {
        self.word_completion
    }

    fn dismiss_word_completion(&mut self) {
        self.word_completion = false;
    }
}

pub struct SimHost {
    surfaces: UiSurfaces,
    document: RopeSnapshot,
    cursor: usize,
    version: u64,
    doc_events: EventHub<TextChangedEvent>,
}

impl SimHost {
    pub fn new(text: &str, surfaces: UiSurfaces) -> Self {
        let document = RopeSnapshot::new(SnapshotId(0), text);
        let cursor = document.len_chars();
        Self {
            surfaces,
            document,
            cursor,
            version: 0,
            doc_events: EventHub::new("document"),
        }
    }

    pub fn doc_events(&self) -> &EventHub<TextChangedEvent> {
        &self.doc_events
    }

    pub fn document(&self) -> &RopeSnapshot {
        &self.document
    }

    fn replace(&mut self, start: usize, end: usize, text: &str) {
        self.version += 1;
        let (next, event) = self
            .document
            .edit(SnapshotId(self.version), start, end, text);
        self.document = next;
        self.cursor = start + text.chars().count();
        trace!(target: "sim.host", version = self.version, start, end, inserted = text, "edit");
        self.doc_events.raise(&event);
    }

    fn insert_at_cursor(&mut self, text: &str) {
        self.replace(self.cursor, self.cursor, text);
    }

    fn run_editor(&mut self, raw: &RawCommand) -> ExecStatus {
        let len = self.document.len_chars();
        match raw.id {
            editor::TYPECHAR => match raw.payload {
                CommandPayload::Char(c) => self.insert_at_cursor(c.encode_utf8(&mut [0; 4])),
                CommandPayload::None => return ExecStatus::NotSupported,
            },
            editor::RETURN => self.insert_at_cursor("\n"),
            editor::TAB => self.insert_at_cursor("\t"),
            editor::BACKSPACE if self.cursor > 0 => self.replace(self.cursor - 1, self.cursor, ""),
            editor::DELETE if self.cursor < len => self.replace(self.cursor, self.cursor + 1, ""),
            editor::BACKSPACE | editor::DELETE => {}
            editor::LEFT => self.cursor = self.cursor.saturating_sub(1),
            editor::RIGHT => self.cursor = (self.cursor + 1).min(len),
            editor::HOME => self.cursor = 0,
            editor::END => self.cursor = len,
            // Popup navigation lands in whichever list is open.
            editor::UP | editor::DOWN | editor::PAGEUP | editor::PAGEDOWN => {}
            editor::CANCEL => self.surfaces = UiSurfaces::empty(),
            _ => return ExecStatus::NotSupported,
        }
        ExecStatus::Ok
    }
}

impl InputGate for SimHost {
    fn in_automation(&self) -> bool {
        false
    }

    fn is_incremental_search_active(&self) -> bool {
        false
    }
}

impl Host for SimHost {
    fn active_surfaces(&self) -> UiSurfaces {
        self.surfaces
    }

    fn document_version(&self) -> u64 {
        self.version
    }

    fn next_query_status(&mut self, raw: &RawCommand) -> CommandState {
        match raw.group {
            CommandGroup::Editor | CommandGroup::Standard => CommandState::Enabled,
            CommandGroup::Other(_) => CommandState::Unsupported,
        }
    }

    fn next_exec(&mut self, raw: &RawCommand, _options: ExecOptions) -> ExecStatus {
        let status = match raw.group {
            CommandGroup::Editor => self.run_editor(raw),
            CommandGroup::Standard if raw.id == standard::PASTE => {
                self.insert_at_cursor(PASTE_TEXT);
                ExecStatus::Ok
            }
            CommandGroup::Standard | CommandGroup::Other(_) => ExecStatus::NotSupported,
        };
        debug!(target: "sim.host", command = %raw, ?status, "exec");
        status
    }
}
