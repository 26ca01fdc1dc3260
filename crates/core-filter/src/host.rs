use core_events::{ExecOptions, RawCommand};
use core_input::InputGate;
use core_state::UiSurfaces;

/// Answer to the host's query callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Supported and enabled.
    Enabled,
    /// Supported but disabled: the host must not offer the command to anyone.
    Disabled,
    /// Nobody in the chain knows the command.
    Unsupported,
}

/// Status code returned from the execute callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Ok,
    NotSupported,
    /// Any other failure code. Some hosts report these even when the edit
    /// happened (e.g. a suppressed completion popup).
    Failed(i32),
}

impl ExecStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ExecStatus::Ok)
    }
}

/// Everything the filter needs from the host editor: the input gate, popup
/// state, document version, and the next handler in the dispatch chain.
pub trait Host: InputGate {
    /// IntelliSense-style popups currently visible.
    fn active_surfaces(&self) -> UiSurfaces;

    /// Monotonic version of the current document; advances on every edit.
    fn document_version(&self) -> u64;

    /// Delegate the query callback to the next handler.
    fn next_query_status(&mut self, raw: &RawCommand) -> CommandState;

    /// Delegate the execute callback to the next handler.
    fn next_exec(&mut self, raw: &RawCommand, options: ExecOptions) -> ExecStatus;
}
