//! Arbitration policy: engine first, or host first?
//!
//! Rules, first match wins:
//! 1. The engine cannot process the key at all -> host.
//! 2. Insert-like mode with an open word-completion session -> host, so the
//!    completion UI behaves normally. Checked before any mapping lookup.
//!
//! The key is then resolved through the engine's mappings. When it does not
//! resolve to exactly one key the engine takes it (multi-key handling is the
//! engine's business). Otherwise, on the resolved key:
//!
//! 3. Navigation/edit key while any IntelliSense surface is visible -> host.
//! 4. Navigation/edit key while a cooperating extension is installed -> host.
//!    Its popups cannot be observed.
//! 5. Otherwise -> engine.

use core_events::KeyEvent;
use core_keymap::try_resolve_single;
use core_state::UiSurfaces;
use tracing::{debug, trace};

use crate::QuirkTable;
use crate::engine::ModalEngine;
use crate::host::Host;

/// Which rule sent a key to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    EngineDeclined,
    WordCompletion,
    IntelliSense,
    CooperatingExtension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Engine,
    Host(Deferral),
}

/// Query-phase classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    /// Report enabled; the engine will take the key in `exec`.
    Enable,
    /// Report supported-but-disabled; hides the key from handlers behind us.
    Disable,
    /// Let the next handler answer.
    PassOn,
}

impl From<Route> for QueryClass {
    fn from(route: Route) -> Self {
        match route {
            Route::Engine => QueryClass::Enable,
            Route::Host(_) => QueryClass::PassOn,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArbitrationPolicy<'a> {
    quirks: &'a QuirkTable,
}

impl<'a> ArbitrationPolicy<'a> {
    pub fn new(quirks: &'a QuirkTable) -> Self {
        Self { quirks }
    }

    /// Decide who processes `key` first. Pure: inspects but never mutates.
    pub fn route<E, H>(&self, engine: &E, host: &H, key: KeyEvent) -> Route
    where
        E: ModalEngine + ?Sized,
        H: Host + ?Sized,
    {
        let route = self.route_inner(engine, host, key);
        debug!(target: "filter.policy", key = %key, mode = ?engine.mode(), ?route, "route");
        route
    }

    /// Query-phase answer for a key the quirk path did not claim.
    pub fn query_class<E, H>(&self, engine: &E, host: &H, key: KeyEvent) -> QueryClass
    where
        E: ModalEngine + ?Sized,
        H: Host + ?Sized,
    {
        self.route(engine, host, key).into()
    }

    fn route_inner<E, H>(&self, engine: &E, host: &H, key: KeyEvent) -> Route
    where
        E: ModalEngine + ?Sized,
        H: Host + ?Sized,
    {
        if !engine.can_process(key) {
            return Route::Host(Deferral::EngineDeclined);
        }
        if engine.mode().is_insert_like() && engine.has_word_completion() {
            return Route::Host(Deferral::WordCompletion);
        }
        let Some(resolved) = try_resolve_single(engine, key) else {
            trace!(target: "filter.policy", key = %key, "ambiguous_mapping_to_engine");
            return Route::Engine;
        };
        match self.navigation_deferral(host.active_surfaces(), resolved) {
            Some(d) => Route::Host(d),
            None => Route::Engine,
        }
    }

    /// Rules 3 and 4 applied to an already resolved key.
    pub fn navigation_deferral(
        &self,
        surfaces: UiSurfaces,
        resolved: KeyEvent,
    ) -> Option<Deferral> {
        if !resolved.is_navigation_or_edit() {
            return None;
        }
        if !surfaces.is_empty() {
            return Some(Deferral::IntelliSense);
        }
        if self.quirks.defers_navigation() {
            return Some(Deferral::CooperatingExtension);
        }
        None
    }

    /// Side effects of deferring in the execute phase: a key handed to a host
    /// popup must not leave the engine's own completion list behind.
    pub fn settle<E>(&self, engine: &mut E, deferral: Deferral)
    where
        E: ModalEngine + ?Sized,
    {
        if matches!(
            deferral,
            Deferral::IntelliSense | Deferral::CooperatingExtension
        ) && engine.has_word_completion()
        {
            debug!(target: "filter.policy", ?deferral, "dismiss_word_completion");
            engine.dismiss_word_completion();
        }
    }
}
