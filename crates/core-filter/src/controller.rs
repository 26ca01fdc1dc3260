//! Two-phase protocol controller.
//!
//! Every keystroke arrives as a query followed (usually) by an execute. The
//! two calls are independent: each normalizes the raw command itself, and the
//! only state carried between them is the [`DiscardedKey`] slot written by the
//! quirk path during the query.

use core_config::FilterConfig;
use core_events::{EditorCommand, ExecOptions, KeyEvent, KeyModifiers, RawCommand};
use core_input::{NativeEdit, normalize};
use core_state::DiscardedKey;
use tracing::debug;

use crate::QuirkTable;
use crate::engine::ModalEngine;
use crate::host::{CommandState, ExecStatus, Host};
use crate::native::{NativeEditSink, NativeEditor};
use crate::policy::{ArbitrationPolicy, QueryClass, Route};
use crate::quirk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Delegate primitive insert-mode edits to the host.
    pub native_edits: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self { native_edits: true }
    }
}

impl From<&FilterConfig> for FilterOptions {
    fn from(cfg: &FilterConfig) -> Self {
        Self {
            native_edits: cfg.native_edits,
        }
    }
}

/// The command filter installed in the host's dispatch chain.
pub struct CommandFilter<E: ModalEngine, H: Host> {
    engine: E,
    host: H,
    quirks: QuirkTable,
    options: FilterOptions,
    discarded: DiscardedKey,
}

impl<E: ModalEngine, H: Host> CommandFilter<E, H> {
    pub fn new(engine: E, host: H, quirks: QuirkTable, options: FilterOptions) -> Self {
        Self {
            engine,
            host,
            quirks,
            options,
            discarded: DiscardedKey::new(),
        }
    }

    /// Query phase: "can you handle this command?"
    pub fn query_status(&mut self, raw: &RawCommand, mods: KeyModifiers) -> CommandState {
        let Some(cmd) = normalize(&self.host, raw, mods) else {
            return self.host.next_query_status(raw);
        };
        // A query for anything normalizable starts a fresh round trip.
        self.discarded.clear();

        let class = match cmd {
            EditorCommand::Undo | EditorCommand::Redo => QueryClass::Enable,
            EditorCommand::Key(key) => self.query_key(key),
            EditorCommand::Host(id) => {
                debug_assert!(false, "normalize passed host command {id:?}");
                QueryClass::PassOn
            }
        };
        let state = match class {
            QueryClass::Enable => CommandState::Enabled,
            QueryClass::Disable => CommandState::Disabled,
            QueryClass::PassOn => self.host.next_query_status(raw),
        };
        debug!(
            target: "filter.query",
            command = %raw,
            ?cmd,
            ?class,
            ?state,
            "query"
        );
        state
    }

    fn query_key(&mut self, key: KeyEvent) -> QueryClass {
        let mut native = NativeEditor::new(&mut self.host, self.options.native_edits);
        if let Some(class) = quirk::eager_query(&self.quirks, &mut self.engine, &mut native, key) {
            self.discarded.set(key);
            return class;
        }
        ArbitrationPolicy::new(&self.quirks).query_class(&self.engine, &self.host, key)
    }

    /// Execute phase: "handle this command."
    pub fn exec(
        &mut self,
        raw: &RawCommand,
        mods: KeyModifiers,
        options: ExecOptions,
    ) -> ExecStatus {
        let cmd = normalize(&self.host, raw, mods);
        let handled = match cmd {
            Some(cmd) => self.exec_command(cmd),
            None => false,
        };
        // Cleared on every path, and before the next handler can re-enter us.
        self.discarded.clear();

        let status = if handled {
            ExecStatus::Ok
        } else {
            self.host.next_exec(raw, options)
        };
        debug!(
            target: "filter.exec",
            command = %raw,
            ?cmd,
            handled,
            ?status,
            "exec"
        );
        status
    }

    fn exec_command(&mut self, cmd: EditorCommand) -> bool {
        match cmd {
            EditorCommand::Key(key) if self.discarded.matches(key) => {
                debug!(target: "filter.exec", key = %key, "already_processed_in_query");
                true
            }
            EditorCommand::Key(key) => self.exec_key(key),
            EditorCommand::Undo => {
                self.engine.undo(1);
                true
            }
            EditorCommand::Redo => {
                self.engine.redo(1);
                true
            }
            EditorCommand::Host(id) => {
                debug_assert!(false, "normalize passed host command {id:?}");
                false
            }
        }
    }

    fn exec_key(&mut self, key: KeyEvent) -> bool {
        let policy = ArbitrationPolicy::new(&self.quirks);
        match policy.route(&self.engine, &self.host, key) {
            Route::Engine => {
                let mut native = NativeEditor::new(&mut self.host, self.options.native_edits);
                self.engine.process(key, &mut native)
            }
            Route::Host(deferral) => {
                policy.settle(&mut self.engine, deferral);
                false
            }
        }
    }

    /// Ask the host to perform a primitive edit itself. See [`NativeEditor`].
    pub fn try_native_edit(&mut self, edit: NativeEdit) -> bool {
        NativeEditor::new(&mut self.host, self.options.native_edits).try_native_edit(edit)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn discarded_key(&self) -> &DiscardedKey {
        &self.discarded
    }

    pub fn quirks(&self) -> &QuirkTable {
        &self.quirks
    }

    pub fn options(&self) -> FilterOptions {
        self.options
    }
}
