//! Batch registration of handlers.

use super::subscription::Subscription;
use crate::error::Result;
use crate::routing::{ExactType, Route};
use crate::transport::Transport;
use std::fmt;

/// Something that registers a batch of handlers in one go.
///
/// `subscribe` is called once each time the participant joins a transport.
/// The subscriptions it returns are held by the transport until the
/// participant is withdrawn.
pub trait Participant<R: Route = ExactType>: Send + Sync + 'static {
    fn subscribe(&self, transport: &Transport<R>) -> Vec<Subscription>;
}

/// Handle returned by [`Transport::participate`]. Closing or dropping it
/// withdraws the participant.
#[must_use = "dropping a Participation withdraws the participant; call detach() to keep it"]
pub struct Participation {
    participant: &'static str,
    subscription: Subscription,
}

impl Participation {
    pub(crate) fn new(participant: &'static str, subscription: Subscription) -> Self {
        Self {
            participant,
            subscription,
        }
    }

    /// Withdraw the participant. Later calls do nothing.
    pub fn close(&self) -> Result<()> {
        self.subscription.close()
    }

    pub fn is_closed(&self) -> bool {
        self.subscription.is_closed()
    }

    /// Keep the participant registered until it is withdrawn explicitly.
    pub fn detach(self) {
        self.subscription.detach();
    }

    /// Type name of the participant.
    pub fn participant(&self) -> &'static str {
        self.participant
    }
}

impl fmt::Debug for Participation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participation")
            .field("participant", &self.participant)
            .field("closed", &self.is_closed())
            .finish()
    }
}
