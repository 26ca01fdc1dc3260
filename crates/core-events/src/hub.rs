//! Single-threaded event subscription with scoped teardown.
//!
//! Host notifications (document edits, display settings) and the adornment
//! invalidation signal are all delivered on the UI thread, so handlers are
//! `Rc`-shared closures rather than channel endpoints.
//!
//! Lifecycle: a consumer subscribes to every hub it needs while it is being
//! constructed and collects the resulting [`Subscription`]s into one
//! [`Registration`]. Releasing the registration (explicitly via
//! [`Registration::release`] or on drop) detaches every subscription in one
//! step; there is no API to drop only some of them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

type Handler<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct HubInner<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Broadcast point for one notification type.
pub struct EventHub<T> {
    name: &'static str,
    inner: Rc<RefCell<HubInner<T>>>,
}

impl<T: 'static> EventHub<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Rc::new(RefCell::new(HubInner {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self, handler: impl FnMut(&T) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let handler: Handler<T> = Rc::new(RefCell::new(handler));
        inner.handlers.push((id, handler));
        trace!(target: "runtime.events", hub = self.name, id, "subscribe");

        let weak: Weak<RefCell<HubInner<T>>> = Rc::downgrade(&self.inner);
        let name = self.name;
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().handlers.retain(|(h, _)| *h != id);
                    trace!(target: "runtime.events", hub = name, id, "unsubscribe");
                }
            })),
        }
    }

    /// Deliver `event` to every current subscriber in subscription order.
    ///
    /// The handler list is snapshotted first, so a handler may subscribe or
    /// release registrations while the event is being raised. A handler that
    /// is still running (it raised on its own hub) misses the nested event.
    /// Returns how many handlers received it.
    pub fn raise(&self, event: &T) -> usize {
        let handlers: Vec<Handler<T>> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        let mut delivered = 0;
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut h) => {
                    h(event);
                    delivered += 1;
                }
                Err(_) => {
                    warn!(
                        target: "runtime.events",
                        hub = self.name,
                        "reentrant_handler_skipped"
                    );
                }
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

/// One live handler registration. Detaches when dropped.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn detach(&mut self) {
        if let Some(f) = self.detach.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Set of subscriptions owned by one consumer and released together.
#[derive(Default)]
#[must_use = "dropping a Registration releases all of its subscriptions"]
pub struct Registration {
    subscriptions: Vec<Subscription>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every subscription. Consumes the registration, so it can only
    /// happen once.
    pub fn release(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        for mut sub in self.subscriptions.drain(..) {
            sub.detach();
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
