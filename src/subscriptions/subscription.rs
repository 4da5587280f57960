//! Disposable handle for one registration.

use crate::error::{BoxError, Result, TransportError};
use parking_lot::Mutex;
use std::fmt;

pub(crate) type Closer = Box<dyn FnOnce() -> Result<()> + Send>;

/// Handle for one active registration.
///
/// Two states: open and closed. The first `close()` runs the teardown, any
/// later call does nothing.
#[must_use = "dropping a Subscription closes it; call detach() to keep it registered"]
pub struct Subscription {
    closer: Mutex<Option<Closer>>,
}

impl Subscription {
    /// Subscription whose teardown is `f`. A failure from `f` is reported
    /// as [`TransportError::SubscriptionClose`].
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), BoxError> + Send + 'static,
    {
        Self::with_closer(Box::new(move || {
            f().map_err(|source| TransportError::SubscriptionClose { source })
        }))
    }

    pub(crate) fn with_closer(closer: Closer) -> Self {
        Self {
            closer: Mutex::new(Some(closer)),
        }
    }

    /// Run the teardown if it has not run yet.
    pub fn close(&self) -> Result<()> {
        let closer = self.closer.lock().take();
        match closer {
            Some(closer) => closer(),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closer.lock().is_none()
    }

    /// Give up the handle without closing it. The registration then lives
    /// as long as whatever owns it.
    pub fn detach(self) {
        self.closer.lock().take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "subscription failed to close on drop");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
