//! Core types for the transport.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Order in which handlers receive an event.
///
/// `Highest` sorts first, so handlers registered at `Highest` run before
/// everything else in the same routing bucket.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

impl Priority {
    /// Every priority, in dispatch order.
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Lowest,
    ];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Highest => "highest",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Lowest => "lowest",
        };
        f.write_str(name)
    }
}

/// Key used to look up the handler bucket for an event.
///
/// Type keys compare by [`TypeId`] only; the name is carried for logs.
#[derive(Clone, Copy)]
pub enum RoutingKey {
    /// A concrete event type.
    Type { id: TypeId, name: &'static str },
    /// An application-defined tag, for routes that group events by
    /// something other than their type.
    Tag(&'static str),
}

impl RoutingKey {
    /// Key for the event type `E`.
    pub fn of<E: Any + ?Sized>() -> Self {
        RoutingKey::Type {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Key for the runtime type of `event`.
    pub fn of_val(event: &dyn Event) -> Self {
        RoutingKey::Type {
            id: event.as_any().type_id(),
            name: event.event_name(),
        }
    }

    /// Key for an application-defined tag.
    pub const fn tag(tag: &'static str) -> Self {
        RoutingKey::Tag(tag)
    }

    /// Human-readable name of the key.
    pub fn name(&self) -> &'static str {
        match self {
            RoutingKey::Type { name, .. } => name,
            RoutingKey::Tag(tag) => tag,
        }
    }
}

impl PartialEq for RoutingKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RoutingKey::Type { id: a, .. }, RoutingKey::Type { id: b, .. }) => a == b,
            (RoutingKey::Tag(a), RoutingKey::Tag(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RoutingKey {}

impl Hash for RoutingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RoutingKey::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            RoutingKey::Tag(tag) => {
                1u8.hash(state);
                tag.hash(state);
            }
        }
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingKey::Type { name, .. } => write!(f, "Type({})", name),
            RoutingKey::Tag(tag) => write!(f, "Tag({})", tag),
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upcast helper so `dyn Event` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value that can be submitted to a transport.
///
/// Events that can be cancelled return themselves from
/// [`as_cancellable`](Event::as_cancellable):
///
/// ```ignore
/// struct Ping { cancelled: bool }
///
/// impl Cancellable for Ping {
///     fn is_cancelled(&self) -> bool { self.cancelled }
///     fn set_cancelled(&mut self, cancelled: bool) { self.cancelled = cancelled }
/// }
///
/// impl Event for Ping {
///     fn as_cancellable(&self) -> Option<&dyn Cancellable> { Some(self) }
/// }
/// ```
pub trait Event: AsAny {
    /// The cancellation capability of this event, if it has one.
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }

    /// Name of the concrete event type.
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Event {
    /// Whether the event carries the cancellation capability and is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.as_cancellable().is_some_and(Cancellable::is_cancelled)
    }

    /// Borrow the event as its concrete type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// Mutably borrow the event as its concrete type.
    pub fn downcast_mut<E: Event>(&mut self) -> Option<&mut E> {
        self.as_any_mut().downcast_mut::<E>()
    }
}

/// Cooperative cancellation flag carried by some events.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}
