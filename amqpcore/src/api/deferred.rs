//! Handles to the outcome of an asynchronous operation.
//!
//! An operation returns a [`Deferred`] right away, the outcome arrives later
//! when the broker replies. Handlers are plain closures kept in slots:
//!
//! * each slot keeps the last handler registered;
//! * a handler registered after the outcome is known runs immediately;
//! * the outcome is decided exactly once, later attempts are ignored.
//!
//! [`Consumer`] extends it with slots for deliveries and broker-initiated
//! cancellation.
use std::{cell::RefCell, fmt, rc::Rc};

use super::{
    error::{Error, Result},
    message::Message,
};

type SuccessHandler<T> = Box<dyn FnOnce(&T)>;
type ErrorHandler = Box<dyn FnOnce(&Error)>;
type FinalizeHandler = Box<dyn FnOnce()>;

struct Slots<T> {
    outcome: Option<Rc<Result<T>>>,
    on_success: Option<SuccessHandler<T>>,
    on_error: Option<ErrorHandler>,
    on_finalize: Option<FinalizeHandler>,
}

/// Outcome of an asynchronous operation.
///
/// Clones share the same slots.
pub struct Deferred<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T: 'static> Deferred<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                outcome: None,
                on_success: None,
                on_error: None,
                on_finalize: None,
            })),
        }
    }

    /// A deferred already resolved with `result`.
    #[cfg(test)]
    pub(crate) fn resolved(result: Result<T>) -> Self {
        let deferred = Self::new();
        deferred.resolve(result);
        deferred
    }

    fn outcome(&self) -> Option<Rc<Result<T>>> {
        self.slots.borrow().outcome.clone()
    }

    /// Register the handler run with the value on success.
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T) + 'static,
    {
        match self.outcome() {
            Some(outcome) => {
                if let Ok(value) = outcome.as_ref() {
                    f(value);
                }
            }
            None => self.slots.borrow_mut().on_success = Some(Box::new(f)),
        }
        self
    }

    /// Register the handler run with the error on failure.
    pub fn on_error<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Error) + 'static,
    {
        match self.outcome() {
            Some(outcome) => {
                if let Err(err) = outcome.as_ref() {
                    f(err);
                }
            }
            None => self.slots.borrow_mut().on_error = Some(Box::new(f)),
        }
        self
    }

    /// Register the handler run after the success or error handler, whatever the outcome.
    pub fn on_finalize<F>(&self, f: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        match self.outcome() {
            Some(_) => f(),
            None => self.slots.borrow_mut().on_finalize = Some(Box::new(f)),
        }
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.slots.borrow().outcome.is_some()
    }

    /// Decide the outcome and run the handlers. No-op if already resolved.
    pub(crate) fn resolve(&self, result: Result<T>) {
        let (outcome, on_success, on_error, on_finalize) = {
            let mut slots = self.slots.borrow_mut();
            if slots.outcome.is_some() {
                return;
            }
            let outcome = Rc::new(result);
            slots.outcome = Some(outcome.clone());
            (
                outcome,
                slots.on_success.take(),
                slots.on_error.take(),
                slots.on_finalize.take(),
            )
        };
        // slots are released, handlers may register again or resolve others
        match outcome.as_ref() {
            Ok(value) => {
                if let Some(f) = on_success {
                    f(value);
                }
            }
            Err(err) => {
                if let Some(f) = on_error {
                    f(err);
                }
            }
        }
        if let Some(f) = on_finalize {
            f();
        }
    }

    pub(crate) fn fail(&self, err: Error) {
        self.resolve(Err(err));
    }
}

/////////////////////////////////////////////////////////////////////////////
type ReceivedHandler = Box<dyn FnMut(&Message)>;
type CancelledHandler = Box<dyn FnOnce(&str)>;

#[derive(Default)]
struct ConsumerSlots {
    on_received: Option<ReceivedHandler>,
    on_cancelled: Option<CancelledHandler>,
    // consumer tag, once the broker cancelled the consumer
    cancelled: Option<String>,
}

/// Outcome of `basic.consume`, resolved with the consumer tag, plus the
/// delivery and cancellation handlers of the consumer.
///
/// `on_received` runs for every message delivered to the consumer until it is
/// cancelled or its channel closes.
#[derive(Clone)]
pub struct Consumer {
    deferred: Deferred<String>,
    slots: Rc<RefCell<ConsumerSlots>>,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("resolved", &self.is_resolved())
            .field("cancelled", &self.slots.borrow().cancelled)
            .finish()
    }
}

impl Consumer {
    pub(crate) fn new() -> Self {
        Self {
            deferred: Deferred::new(),
            slots: Rc::new(RefCell::new(ConsumerSlots::default())),
        }
    }

    pub(crate) fn deferred(&self) -> &Deferred<String> {
        &self.deferred
    }

    /// Register the handler run with the consumer tag once the broker accepted the consumer.
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&String) + 'static,
    {
        self.deferred.on_success(f);
        self
    }

    pub fn on_error<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Error) + 'static,
    {
        self.deferred.on_error(f);
        self
    }

    pub fn on_finalize<F>(&self, f: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        self.deferred.on_finalize(f);
        self
    }

    /// Register the handler run for each delivered message.
    pub fn on_received<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Message) + 'static,
    {
        self.slots.borrow_mut().on_received = Some(Box::new(f));
        self
    }

    /// Register the handler run with the consumer tag when the broker cancels
    /// the consumer, e.g. because its queue was deleted.
    pub fn on_cancelled<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&str) + 'static,
    {
        let cancelled = self.slots.borrow().cancelled.clone();
        match cancelled {
            Some(consumer_tag) => f(&consumer_tag),
            None => self.slots.borrow_mut().on_cancelled = Some(Box::new(f)),
        }
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.deferred.is_resolved()
    }

    pub(crate) fn deliver(&self, message: &Message) {
        let handler = self.slots.borrow_mut().on_received.take();
        if let Some(mut f) = handler {
            f(message);
            // keep a handler registered from within the callback
            let mut slots = self.slots.borrow_mut();
            if slots.on_received.is_none() {
                slots.on_received = Some(f);
            }
        }
    }

    pub(crate) fn cancelled(&self, consumer_tag: &str) {
        let handler = {
            let mut slots = self.slots.borrow_mut();
            if slots.cancelled.is_some() {
                return;
            }
            slots.cancelled = Some(consumer_tag.to_owned());
            slots.on_received = None;
            slots.on_cancelled.take()
        };
        if let Some(f) = handler {
            f(consumer_tag);
        }
    }

    /// Drop the delivery handler once the consumer is gone.
    pub(crate) fn deregister(&self) {
        self.slots.borrow_mut().on_received = None;
    }
}
