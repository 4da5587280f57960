//! Route strategies: the acceptance gate and key digest of a transport.

use crate::types::{Event, RoutingKey};
use std::fmt;

/// Decides which events a transport takes and where they go.
pub trait Route: Send + Sync + 'static {
    /// Gate run before routing. Rejected events reach no handler.
    fn should_accept(&self, _event: &dyn Event) -> bool {
        true
    }

    /// Key of the handler bucket `event` is dispatched to.
    fn digest(&self, event: &dyn Event) -> RoutingKey;

    /// Add an acceptance predicate on top of this route.
    fn accepting<P>(self, predicate: P) -> Accepting<Self, P>
    where
        Self: Sized,
        P: Fn(&dyn Event) -> bool + Send + Sync + 'static,
    {
        Accepting {
            route: self,
            predicate,
        }
    }
}

/// Routes every event by its exact runtime type.
///
/// There is no supertype matching: a handler registered for one type is
/// never reached by an event of another type.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactType;

impl Route for ExactType {
    fn digest(&self, event: &dyn Event) -> RoutingKey {
        RoutingKey::of_val(event)
    }
}

/// Route whose key comes from a closure.
pub struct RouteFn<F> {
    digest: F,
}

impl<F> RouteFn<F>
where
    F: Fn(&dyn Event) -> RoutingKey + Send + Sync + 'static,
{
    pub fn new(digest: F) -> Self {
        Self { digest }
    }
}

impl<F> Route for RouteFn<F>
where
    F: Fn(&dyn Event) -> RoutingKey + Send + Sync + 'static,
{
    fn digest(&self, event: &dyn Event) -> RoutingKey {
        (self.digest)(event)
    }
}

impl<F> fmt::Debug for RouteFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteFn").finish_non_exhaustive()
    }
}

/// A route with an extra acceptance predicate. Built by [`Route::accepting`].
pub struct Accepting<R, P> {
    route: R,
    predicate: P,
}

impl<R, P> Route for Accepting<R, P>
where
    R: Route,
    P: Fn(&dyn Event) -> bool + Send + Sync + 'static,
{
    fn should_accept(&self, event: &dyn Event) -> bool {
        self.route.should_accept(event) && (self.predicate)(event)
    }

    fn digest(&self, event: &dyn Event) -> RoutingKey {
        self.route.digest(event)
    }
}

impl<R: fmt::Debug, P> fmt::Debug for Accepting<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accepting")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}
