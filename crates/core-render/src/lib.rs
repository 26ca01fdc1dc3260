//! Rendering-side adornments kept aligned with a live document.
//!
//! * [`adornment`] – sorted position cache shifted by edit notifications.
//! * [`snapshot`] – snapshot trait plus a rope-backed implementation.
//! * [`source`] – control-character adornment source wired to host events.

pub mod adornment;
pub mod snapshot;
pub mod source;

pub use adornment::{AdornmentCache, AdornmentEntry};
pub use snapshot::{RopeSnapshot, TextSnapshot};
pub use source::{
    AdornmentsInvalidated, AttachedAdornments, ControlCharAdornments, ElementFactory,
    control_char_display,
};
