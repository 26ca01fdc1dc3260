//! core-filter: decides who gets to see a keystroke.
//!
//! The host asks twice per keystroke: `query_status` ("will you handle
//! this?") and later `exec` ("handle it"). [`CommandFilter`] answers both,
//! routing each key either to the modal engine or down the host's own handler
//! chain. Layers, leaf first:
//!
//! * [`policy`] – ordered routing rules (engine capability, word completion,
//!   IntelliSense popups, cooperating extension).
//! * [`quirk`] – query-time eager processing for keys a cooperating extension
//!   would otherwise swallow before `exec` reaches us.
//! * [`native`] – asking the host to perform primitive edits itself.
//! * [`controller`] – the two-phase protocol and the `DiscardedKey` slot.

pub mod controller;
pub mod engine;
pub mod host;
pub mod native;
pub mod policy;
pub mod quirk;

pub use controller::{CommandFilter, FilterOptions};
pub use engine::{ModalEngine, remap_mode};
pub use host::{CommandState, ExecStatus, Host};
pub use native::{NativeEditSink, NativeEditor};
pub use policy::{ArbitrationPolicy, Deferral, QueryClass, Route};

pub use core_config::{QuirkAction, QuirkKeyClass, QuirkTable};
pub use core_input::NativeEdit;
