//! Subscription lifecycle.
//!
//! Every registration on a transport is represented by a [`Subscription`]:
//! - `close()` removes the registration; closing again is a no-op
//! - dropping an open subscription closes it
//! - `detach()` gives the registration to the transport for good
//!
//! A [`Participant`] registers a batch of handlers at once. The transport
//! keeps the batch on the participant's behalf until it is withdrawn,
//! either through [`Transport::withdraw`](crate::Transport::withdraw) or
//! by closing the [`Participation`] returned from `participate`.
//!
//! # Example
//!
//! ```ignore
//! struct Auditor;
//!
//! impl Participant for Auditor {
//!     fn subscribe(&self, transport: &Transport) -> Vec<Subscription> {
//!         vec![
//!             transport.on(|login: &mut Login| println!("{}", login.user)),
//!             transport.on(|logout: &mut Logout| println!("{}", logout.user)),
//!         ]
//!     }
//! }
//!
//! let auditor = Arc::new(Auditor);
//! let participation = transport.participate(&auditor)?;
//! // ...
//! participation.close()?;
//! ```

mod participant;
mod subscription;

pub use participant::{Participant, Participation};
pub use subscription::Subscription;
