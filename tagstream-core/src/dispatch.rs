//! Event dispatcher.
//!
//! One optional handler per [`EventKind`]; registering again replaces the
//! previous one. Events are queued and delivered in order. When a handler
//! fails, its error goes back to the caller and the events behind it stay
//! queued for the next [`Dispatcher::drain`].
//!
//! Diagnostics follow a default-throw policy: with no `error` handler
//! registered, an `error` event is returned as [`Error::Diagnostic`] instead
//! of being dropped. Every diagnostic is recorded either way.

use std::collections::VecDeque;
use std::fmt;

use strum::{EnumCount, IntoEnumIterator};

use crate::error::{Diagnostic, Error, HandlerError};
use crate::event::{Event, EventKind};

/// A registered event handler.
pub type Handler<'h> = Box<dyn FnMut(&Event) -> Result<(), HandlerError> + 'h>;

pub struct Dispatcher<'h> {
    handlers: Vec<Option<Handler<'h>>>,
    queue: VecDeque<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl<'h> Default for Dispatcher<'h> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> Dispatcher<'h> {
    pub fn new() -> Self {
        Self {
            handlers: (0..EventKind::COUNT).map(|_| None).collect(),
            queue: VecDeque::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) -> Result<(), HandlerError> + 'h,
    {
        if self.handlers[kind.index()].replace(Box::new(handler)).is_some() {
            log::trace!(target: "tagstream::dispatch", "replaced {kind} handler");
        }
    }

    /// Remove the handler for `kind`. Returns whether one was registered.
    pub fn off(&mut self, kind: EventKind) -> bool {
        self.handlers[kind.index()].take().is_some()
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers[kind.index()].is_some()
    }

    /// Queue an event for delivery. Diagnostics are recorded here.
    pub fn enqueue(&mut self, event: Event) {
        if let Event::Error(diagnostic) = &event {
            self.diagnostics.push(diagnostic.clone());
        }
        self.queue.push_back(event);
    }

    /// Events queued but not delivered yet.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Every diagnostic seen so far, delivered or not.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Deliver queued events in order.
    ///
    /// Stops at the first handler error, or at the first diagnostic when no
    /// `error` handler is registered. The failing event counts as delivered.
    pub fn drain(&mut self) -> Result<(), Error> {
        while let Some(event) = self.queue.pop_front() {
            let kind = event.kind();
            match (self.handlers[kind.index()].as_mut(), event) {
                (Some(handler), event) => {
                    handler(&event).map_err(|source| Error::Handler { event: kind, source })?;
                }
                (None, Event::Error(diagnostic)) => {
                    log::debug!(target: "tagstream::dispatch", "no error handler, raising: {diagnostic}");
                    return Err(Error::Diagnostic(diagnostic));
                }
                (None, _) => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<EventKind> = EventKind::iter().filter(|&k| self.has_handler(k)).collect();
        f.debug_struct("Dispatcher")
            .field("handlers", &registered)
            .field("queued", &self.queue.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
