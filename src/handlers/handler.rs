//! The handler contract and its closure wrapper.

use crate::error::BoxError;
use crate::types::{Event, Priority};
use std::fmt;
use std::marker::PhantomData;

/// What a handler returns. An `Err` is a handler failure.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Receives events of type `E` from a transport.
///
/// `priority` and `ignore_cancelled` are read once, when the handler is
/// registered.
pub trait Handler<E: ?Sized>: Send + Sync + 'static {
    /// Handle one event.
    fn handle(&self, event: &mut E) -> HandlerResult;

    /// Where this handler sits in the dispatch order.
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// Whether this handler still runs once the event is cancelled.
    fn ignore_cancelled(&self) -> bool {
        false
    }
}

/// A closure with dispatch attributes attached.
pub struct FnHandler<E: ?Sized, F> {
    f: F,
    priority: Priority,
    ignore_cancelled: bool,
    _event: PhantomData<fn(&mut E)>,
}

impl<E: ?Sized, F> FnHandler<E, F>
where
    F: Fn(&mut E) -> HandlerResult,
{
    /// Wrap `f` with default attributes (`Normal`, skipped when cancelled).
    pub fn new(f: F) -> Self {
        Self {
            f,
            priority: Priority::Normal,
            ignore_cancelled: false,
            _event: PhantomData,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Keep receiving the event after it has been cancelled.
    pub fn ignoring_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }
}

impl<E, F> Handler<E> for FnHandler<E, F>
where
    E: ?Sized + 'static,
    F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, event: &mut E) -> HandlerResult {
        (self.f)(event)
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn ignore_cancelled(&self) -> bool {
        self.ignore_cancelled
    }
}

impl<E: ?Sized, F> fmt::Debug for FnHandler<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("priority", &self.priority)
            .field("ignore_cancelled", &self.ignore_cancelled)
            .finish_non_exhaustive()
    }
}

/// Puts an `E`-typed handler into a `dyn Event` bucket.
///
/// Events of another concrete type that a custom route sends to the same
/// key are passed over.
pub(crate) struct Typed<E, H> {
    handler: H,
    _event: PhantomData<fn(&mut E)>,
}

impl<E, H> Typed<E, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<E, H> Handler<dyn Event> for Typed<E, H>
where
    E: Event,
    H: Handler<E>,
{
    fn handle(&self, event: &mut (dyn Event + 'static)) -> HandlerResult {
        match event.downcast_mut::<E>() {
            Some(event) => self.handler.handle(event),
            None => {
                tracing::trace!(
                    expected = std::any::type_name::<E>(),
                    got = event.event_name(),
                    "event type does not match handler, passing over"
                );
                Ok(())
            }
        }
    }

    fn priority(&self) -> Priority {
        self.handler.priority()
    }

    fn ignore_cancelled(&self) -> bool {
        self.handler.ignore_cancelled()
    }
}
