//! Control-character adornments (`^M`, `^[`, `^?`) for the rendering layer.
//!
//! The source answers range queries from the renderer, creating elements
//! lazily and caching them by position. Document edits move cached entries,
//! display-setting and format changes drop them wholesale and announce it
//! through [`ControlCharAdornments::invalidated`].

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use core_events::{EventHub, Registration, SettingsEvent, SnapshotId, TextChangedEvent};
use tracing::debug;

use crate::adornment::AdornmentCache;
use crate::snapshot::TextSnapshot;

/// Builds pre-measured renderable elements for a display text.
pub trait ElementFactory {
    type Element: Clone;

    fn create(&mut self, display: &str) -> Self::Element;
}

/// Caret notation for characters that get an adornment. Tab, line feed and
/// carriage return render natively and get none.
pub fn control_char_display(ch: char) -> Option<String> {
    match ch {
        '\t' | '\n' | '\r' => None,
        '\u{0}'..='\u{1f}' => {
            let caret = char::from(ch as u8 + b'@');
            Some(format!("^{caret}"))
        }
        '\u{7f}' => Some("^?".to_string()),
        _ => None,
    }
}

/// Raised after every wholesale invalidation of cached adornments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdornmentsInvalidated;

pub struct ControlCharAdornments<F: ElementFactory> {
    factory: F,
    cache: AdornmentCache<F::Element>,
    enabled: bool,
    current: Option<SnapshotId>,
    invalidated: Rc<EventHub<AdornmentsInvalidated>>,
}

impl<F: ElementFactory> ControlCharAdornments<F> {
    pub fn new(factory: F, enabled: bool) -> Self {
        Self {
            factory,
            cache: AdornmentCache::new(),
            enabled,
            current: None,
            invalidated: Rc::new(EventHub::new("adornments_invalidated")),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cache(&self) -> &AdornmentCache<F::Element> {
        &self.cache
    }

    pub fn invalidated(&self) -> &EventHub<AdornmentsInvalidated> {
        &self.invalidated
    }

    /// Adornments inside `range` of `snapshot`, ordered by position.
    ///
    /// Empty when the feature is off or `snapshot` is not the document's
    /// current snapshot.
    pub fn annotations<S>(
        &mut self,
        snapshot: &S,
        range: Range<usize>,
    ) -> Vec<(Range<usize>, F::Element)>
    where
        S: TextSnapshot + ?Sized,
    {
        if !self.enabled {
            return Vec::new();
        }
        let id = snapshot.id();
        match self.current {
            Some(current) if current != id => {
                debug!(target: "render.adornment", queried = ?id, ?current, "stale_snapshot_query");
                return Vec::new();
            }
            Some(_) => {}
            None => self.current = Some(id),
        }
        self.cache.bind(id);

        let end = range.end.min(snapshot.len_chars());
        let mut out = Vec::new();
        for pos in range.start..end {
            let Some(display) = snapshot.char_at(pos).and_then(control_char_display) else {
                continue;
            };
            let factory = &mut self.factory;
            let element = self.cache.get_or_insert_with(pos, || factory.create(&display));
            out.push((pos..pos + 1, element.clone()));
        }
        out
    }

    pub fn on_text_changed(&mut self, event: &TextChangedEvent) {
        self.current = Some(event.snapshot);
        self.cache.apply_changes(event);
    }

    /// Apply a settings notification, raising [`AdornmentsInvalidated`] when
    /// it dropped the cache.
    pub fn on_settings_changed(&mut self, event: &SettingsEvent) {
        if self.apply_settings(event) {
            self.invalidated.raise(&AdornmentsInvalidated);
        }
    }

    fn apply_settings(&mut self, event: &SettingsEvent) -> bool {
        match *event {
            SettingsEvent::ControlCharsDisplay(on) if on == self.enabled => return false,
            SettingsEvent::ControlCharsDisplay(on) => self.enabled = on,
            SettingsEvent::FormatChanged => {}
        }
        debug!(
            target: "render.adornment",
            ?event,
            enabled = self.enabled,
            dropped = self.cache.len(),
            "invalidate"
        );
        self.cache.clear();
        true
    }
}

impl<F> ControlCharAdornments<F>
where
    F: ElementFactory + 'static,
    F::Element: 'static,
{
    /// Build a source and subscribe it to document and settings
    /// notifications. Both subscriptions live in the returned
    /// [`AttachedAdornments`] and are released together.
    pub fn attach(
        doc_events: &EventHub<TextChangedEvent>,
        settings_events: &EventHub<SettingsEvent>,
        factory: F,
        enabled: bool,
    ) -> AttachedAdornments<F> {
        let source = Rc::new(RefCell::new(Self::new(factory, enabled)));
        let invalidated = source.borrow().invalidated.clone();

        let on_doc = {
            let source = Rc::clone(&source);
            doc_events.subscribe(move |ev| source.borrow_mut().on_text_changed(ev))
        };
        let on_settings = {
            let source = Rc::clone(&source);
            // Raise after the borrow ends so listeners may query right away.
            settings_events.subscribe(move |ev| {
                let dropped = source.borrow_mut().apply_settings(ev);
                if dropped {
                    invalidated.raise(&AdornmentsInvalidated);
                }
            })
        };

        AttachedAdornments {
            source,
            registration: Registration::new().with(on_doc).with(on_settings),
        }
    }
}

/// A source wired to its notification hubs.
pub struct AttachedAdornments<F: ElementFactory> {
    source: Rc<RefCell<ControlCharAdornments<F>>>,
    registration: Registration,
}

impl<F: ElementFactory> AttachedAdornments<F> {
    pub fn source(&self) -> Rc<RefCell<ControlCharAdornments<F>>> {
        Rc::clone(&self.source)
    }

    /// Stop listening to both hubs.
    pub fn detach(self) {
        self.registration.release();
    }
}
