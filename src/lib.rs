//! # Event Transport
//!
//! An in-process publish/subscribe dispatcher. Producers submit events,
//! consumers register handlers, and the transport calls the handlers for
//! each event in priority order.
//!
//! ## Core Concepts
//!
//! - **Transport**: Routing table from routing key to handler bucket
//! - **Handlers**: Callables with a priority and a cancellation-visibility flag
//! - **Subscriptions**: Disposable handles, one per registration
//! - **Participants**: Batches of subscriptions registered and withdrawn as a unit
//! - **Cancellable events**: A cooperative flag that hides the event from later handlers
//!
//! ## Example
//!
//! ```ignore
//! use event_transport::{Cancellable, Event, FnHandler, GlobalTransport, Priority};
//!
//! struct Chat { text: String, cancelled: bool }
//!
//! impl Cancellable for Chat {
//!     fn is_cancelled(&self) -> bool { self.cancelled }
//!     fn set_cancelled(&mut self, cancelled: bool) { self.cancelled = cancelled }
//! }
//!
//! impl Event for Chat {
//!     fn as_cancellable(&self) -> Option<&dyn Cancellable> { Some(self) }
//! }
//!
//! let transport = GlobalTransport::default();
//!
//! // Runs first and may cancel the message
//! let filter = transport.subscribe::<Chat, _>(
//!     FnHandler::new(|chat: &mut Chat| {
//!         if chat.text.contains("spam") {
//!             chat.cancel();
//!         }
//!         Ok(())
//!     })
//!     .with_priority(Priority::Highest),
//! );
//!
//! // Never sees cancelled messages
//! let printer = transport.on(|chat: &mut Chat| println!("{}", chat.text));
//!
//! transport.submit(&mut Chat { text: "hello".into(), cancelled: false })?;
//!
//! printer.close()?;
//! ```

pub mod error;
pub mod handlers;
pub mod routing;
pub mod subscriptions;
pub mod transport;
pub mod types;

// Re-exports
pub use error::{BoxError, Result, TransportError};
pub use handlers::{FnHandler, Handler, HandlerResult};
pub use routing::{Accepting, ExactType, Route, RouteFn};
pub use subscriptions::{Participant, Participation, Subscription};
pub use transport::{Dispatch, FaultPolicy, GlobalTransport, Transport, TransportConfig};
pub use types::{AsAny, Cancellable, Event, Priority, RoutingKey};
