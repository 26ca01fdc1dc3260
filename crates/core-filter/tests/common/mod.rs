#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_events::{
    CommandGroup, ExecOptions, KeyCode, KeyEvent, KeyModifiers, RawCommand, parse_keys,
};
use core_filter::{
    CommandFilter, CommandState, ExecStatus, FilterOptions, Host, ModalEngine, NativeEdit,
    NativeEditSink, QuirkTable, remap_mode,
};
use core_input::{InputGate, raw_for_key, standard};
use core_keymap::{KeyMap, MappingResult, MappingSource, RemapMode};
use core_state::{ModeKind, UiSurfaces};
use std::collections::HashSet;

/// Scriptable modal engine.
///
/// Normal mode: `i` enters insert, every other key is "handled". Insert mode:
/// Escape returns to normal, printable keys and primitive edits go through
/// native edit delegation.
#[derive(Default)]
pub struct MockEngine {
    pub mode: ModeKind,
    pub keymap: KeyMap,
    pub buffered: Vec<KeyEvent>,
    pub declined: HashSet<KeyEvent>,
    pub unhandled: HashSet<KeyEvent>,
    pub word_completion: bool,
    pub dismissals: usize,
    pub processed: Vec<KeyEvent>,
    pub native_results: Vec<(NativeEdit, bool)>,
    pub undos: usize,
    pub redos: usize,
}

impl MockEngine {
    pub fn in_mode(mode: ModeKind) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn map(&mut self, mode: RemapMode, lhs: &str, rhs: &str) {
        self.keymap.map(mode, keys(lhs), keys(rhs), false);
    }
}

impl MappingSource for MockEngine {
    fn key_input_mapping(&self, key: KeyEvent) -> MappingResult {
        let mut input = self.buffered.clone();
        input.push(key);
        self.keymap.resolve(remap_mode(self.mode), &input)
    }

    fn buffered_key_inputs(&self) -> &[KeyEvent] {
        &self.buffered
    }
}

impl ModalEngine for MockEngine {
    fn mode(&self) -> ModeKind {
        self.mode
    }

    fn can_process(&self, key: KeyEvent) -> bool {
        self.mode != ModeKind::Disabled && !self.declined.contains(&key)
    }

    fn process(&mut self, key: KeyEvent, native: &mut dyn NativeEditSink) -> bool {
        self.processed.push(key);
        if self.unhandled.contains(&key) {
            return false;
        }
        if self.mode.is_insert_like() {
            if key == KeyEvent::ESCAPE {
                self.mode = ModeKind::Normal;
                return true;
            }
            let edit = match key.code {
                KeyCode::Char(c) if key.mods.is_empty() => Some(NativeEdit::Insert(c)),
                KeyCode::Backspace => Some(NativeEdit::Backspace),
                KeyCode::Delete => Some(NativeEdit::Delete),
                KeyCode::Tab => Some(NativeEdit::Tab),
                KeyCode::Enter => Some(NativeEdit::Newline),
                _ => None,
            };
            if let Some(edit) = edit {
                let done = native.try_native_edit(edit);
                self.native_results.push((edit, done));
            }
            return true;
        }
        if key == KeyEvent::char('i') && self.mode == ModeKind::Normal {
            self.mode = ModeKind::Insert;
        }
        true
    }

    fn undo(&mut self, count: usize) {
        self.undos += count;
    }

    fn redo(&mut self, count: usize) {
        self.redos += count;
    }

    fn has_word_completion(&self) -> bool {
        self.word_completion
    }

    fn dismiss_word_completion(&mut self) {
        self.word_completion = false;
        self.dismissals += 1;
    }
}

/// Host whose next handler records every delegated call.
pub struct MockHost {
    pub automation: bool,
    pub search: bool,
    pub surfaces: UiSurfaces,
    pub version: u64,
    pub query_answer: CommandState,
    pub exec_status: ExecStatus,
    /// Whether a delegated `Editor` command edits the document.
    pub edits_document: bool,
    pub queries: Vec<RawCommand>,
    pub execs: Vec<RawCommand>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            automation: false,
            search: false,
            surfaces: UiSurfaces::empty(),
            version: 0,
            query_answer: CommandState::Unsupported,
            exec_status: ExecStatus::Ok,
            edits_document: true,
            queries: Vec::new(),
            execs: Vec::new(),
        }
    }
}

impl InputGate for MockHost {
    fn in_automation(&self) -> bool {
        self.automation
    }

    fn is_incremental_search_active(&self) -> bool {
        self.search
    }
}

impl Host for MockHost {
    fn active_surfaces(&self) -> UiSurfaces {
        self.surfaces
    }

    fn document_version(&self) -> u64 {
        self.version
    }

    fn next_query_status(&mut self, raw: &RawCommand) -> CommandState {
        self.queries.push(*raw);
        self.query_answer
    }

    fn next_exec(&mut self, raw: &RawCommand, _options: ExecOptions) -> ExecStatus {
        self.execs.push(*raw);
        if self.edits_document && raw.group == CommandGroup::Editor {
            self.version += 1;
        }
        self.exec_status
    }
}

pub type Filter = CommandFilter<MockEngine, MockHost>;

pub fn filter(engine: MockEngine, host: MockHost, quirks: QuirkTable) -> Filter {
    CommandFilter::new(engine, host, quirks, FilterOptions::default())
}

pub fn keys(notation: &str) -> Vec<KeyEvent> {
    parse_keys(notation).expect("valid key notation")
}

pub fn key(notation: &str) -> KeyEvent {
    let parsed = keys(notation);
    assert_eq!(parsed.len(), 1, "expected one key in {notation:?}");
    parsed[0]
}

/// The raw command (and modifier state) a host would deliver for `key`.
pub fn raw_for(key: KeyEvent) -> (RawCommand, KeyModifiers) {
    raw_for_key(key).expect("key has an editor command")
}

pub fn undo_raw() -> RawCommand {
    RawCommand::new(CommandGroup::Standard, standard::UNDO)
}

pub fn redo_raw() -> RawCommand {
    RawCommand::new(CommandGroup::Standard, standard::REDO)
}

pub fn paste_raw() -> RawCommand {
    RawCommand::new(CommandGroup::Standard, standard::PASTE)
}

pub fn query_key(filter: &mut Filter, notation: &str) -> CommandState {
    let (raw, mods) = raw_for(key(notation));
    filter.query_status(&raw, mods)
}

pub fn exec_key(filter: &mut Filter, notation: &str) -> ExecStatus {
    let (raw, mods) = raw_for(key(notation));
    filter.exec(&raw, mods, ExecOptions::default())
}

/// Full keystroke: query followed by execute.
pub fn press(filter: &mut Filter, notation: &str) -> (CommandState, ExecStatus) {
    let state = query_key(filter, notation);
    let status = exec_key(filter, notation);
    (state, status)
}
