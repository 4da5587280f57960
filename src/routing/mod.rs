//! Routing keys and the table of handler buckets.
//!
//! A [`Route`] decides whether a transport accepts an event and which key it
//! is dispatched under. [`ExactType`] keys every event by its runtime type
//! and is what the default transport uses. [`RouteFn`] lets the caller
//! supply the key, so several event types can share one bucket:
//!
//! ```ignore
//! let route = RouteFn::new(|event: &dyn Event| {
//!     if event.downcast_ref::<AdminLogin>().is_some() {
//!         RoutingKey::of::<Login>()
//!     } else {
//!         RoutingKey::of_val(event)
//!     }
//! })
//! .accepting(|event: &dyn Event| !event.is_cancelled());
//!
//! let transport = Transport::new(route);
//! ```

mod route;
mod table;

pub use route::{Accepting, ExactType, Route, RouteFn};
pub(crate) use table::{Registration, Removed, RoutingTable, SubscriptionId};
