//! Native edit delegation.
//!
//! In insert-like modes the engine prefers the host to perform primitive edits
//! (typing, backspace, delete, tab, newline) so that host side effects such as
//! auto-indent and brace completion still fire. Success is either a success
//! status or an advanced document version: some hosts report a failure code
//! after completing the edit (e.g. when a completion popup was suppressed).

use core_events::ExecOptions;
use core_input::{NativeEdit, to_raw_command};
use tracing::debug;

use crate::host::Host;

/// Capability handed to [`crate::ModalEngine::process`] for the duration of
/// one call.
pub trait NativeEditSink {
    /// Ask the host to perform `edit`. Returns whether it happened.
    fn try_native_edit(&mut self, edit: NativeEdit) -> bool;
}

/// Sink that forwards edits to the next handler in the host chain.
pub struct NativeEditor<'a, H: Host + ?Sized> {
    host: &'a mut H,
    enabled: bool,
}

impl<'a, H: Host + ?Sized> NativeEditor<'a, H> {
    pub fn new(host: &'a mut H, enabled: bool) -> Self {
        Self { host, enabled }
    }
}

impl<H: Host + ?Sized> NativeEditSink for NativeEditor<'_, H> {
    fn try_native_edit(&mut self, edit: NativeEdit) -> bool {
        if !self.enabled {
            debug!(target: "filter.native", ?edit, "native_edits_disabled");
            return false;
        }
        let raw = to_raw_command(edit);
        let before = self.host.document_version();
        let status = self.host.next_exec(&raw, ExecOptions::default());
        let after = self.host.document_version();
        let done = status.is_success() || after != before;
        debug!(
            target: "filter.native",
            ?edit,
            ?status,
            version_before = before,
            version_after = after,
            done,
            "native_edit"
        );
        done
    }
}
