//! Handlers invoked by a transport during dispatch.
//!
//! A handler is anything implementing [`Handler`]: a custom struct that
//! chooses its own priority and cancellation visibility, or a closure
//! wrapped in [`FnHandler`].
//!
//! # Example
//!
//! ```ignore
//! let transport = Transport::default();
//!
//! let audit = FnHandler::new(|login: &mut Login| {
//!     println!("login from {}", login.user);
//!     Ok(())
//! })
//! .with_priority(Priority::Lowest)
//! .ignoring_cancelled();
//!
//! let subscription = transport.subscribe::<Login, _>(audit);
//! ```

mod handler;

pub use handler::{FnHandler, Handler, HandlerResult};
pub(crate) use handler::Typed;
