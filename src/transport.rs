//! The transport: routes submitted events to registered handlers.

use crate::error::{Result, TransportError};
use crate::handlers::{FnHandler, Handler, Typed};
use crate::routing::{ExactType, Registration, Route, RoutingTable, SubscriptionId};
use crate::subscriptions::{Participant, Participation, Subscription};
use crate::types::{Event, RoutingKey};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// What happens when a handler fails during dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// The failure is returned from `submit` and the rest of the pass is
    /// abandoned.
    #[default]
    FailFast,
    /// The failure is logged and counted, and dispatch moves on to the next
    /// handler.
    Isolate,
}

/// Transport configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Name used in log output.
    pub name: String,

    /// Handling of handler failures.
    pub fault_policy: FaultPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            name: "transport".to_string(),
            fault_policy: FaultPolicy::FailFast,
        }
    }
}

/// Outcome of one `submit` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The route's acceptance gate refused the event.
    Rejected,
    /// No handler is registered under the event's key.
    Unrouted { key: RoutingKey },
    /// The event went through the bucket for `key`.
    Delivered {
        key: RoutingKey,
        /// Handlers called, including ones that failed. Typed handlers
        /// sharing the key with another event type are not counted.
        invoked: usize,
        /// Handlers passed over because the event was cancelled.
        skipped: usize,
        /// Handlers that failed under [`FaultPolicy::Isolate`].
        failed: usize,
    },
}

impl Dispatch {
    /// Number of handlers called.
    pub fn invoked(&self) -> usize {
        match self {
            Dispatch::Delivered { invoked, .. } => *invoked,
            _ => 0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Dispatch::Delivered { .. })
    }
}

/// Identity of a participant: the address of its `Arc` allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ParticipantKey(usize);

impl ParticipantKey {
    fn of<P: ?Sized>(participant: &Arc<P>) -> Self {
        ParticipantKey(Arc::as_ptr(participant) as *const () as usize)
    }
}

/// A participant's registered batch.
struct Enrollment {
    /// Keeps the allocation, and so the key, from being reused while
    /// registered.
    _participant: Arc<dyn Any + Send + Sync>,
    generation: u64,
    subscriptions: Vec<Subscription>,
}

/// State reachable from subscription handles.
struct Shared {
    config: TransportConfig,
    table: RwLock<RoutingTable>,
    participants: Mutex<HashMap<ParticipantKey, Enrollment>>,
    next_id: AtomicU64,
}

impl Shared {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn unregister(&self, key: &RoutingKey, id: SubscriptionId) {
        let removed = self.table.write().remove(key, id);
        if removed.is_some() {
            debug!(transport = %self.config.name, key = %key, id = %id, "handler unsubscribed");
        }
        // The handler may own subscriptions of its own; they close here,
        // after the write lock is released.
        drop(removed);
    }

    /// Remove and close a participant's batch. With a `generation`, only the
    /// enrollment it names is removed.
    fn withdraw(&self, key: ParticipantKey, generation: Option<u64>) -> Result<usize> {
        let enrollment = {
            let mut participants = self.participants.lock();
            let current = participants.get(&key).map(|enrollment| enrollment.generation);
            match current {
                Some(current) if generation.map_or(true, |g| g == current) => {
                    participants.remove(&key)
                }
                _ => None,
            }
        };

        let Some(enrollment) = enrollment else {
            return Ok(0);
        };

        let count = enrollment.subscriptions.len();
        debug!(transport = %self.config.name, subscriptions = count, "participant withdrawn");

        // Subscriptions left unclosed by an early return close on drop.
        for subscription in enrollment.subscriptions {
            subscription.close()?;
        }
        Ok(count)
    }
}

/// Routes submitted events to handlers in priority order.
///
/// Dispatch is synchronous: `submit` runs every applicable handler on the
/// caller's thread before returning. Each pass iterates a snapshot of the
/// bucket, so handlers may subscribe, close, participate, withdraw or
/// submit on the same transport while it runs.
pub struct Transport<R: Route = ExactType> {
    route: R,
    shared: Arc<Shared>,
}

/// The process-wide bus: every event is routed by its exact runtime type.
/// Construct one at the composition root and pass it where needed.
pub type GlobalTransport = Transport<ExactType>;

impl<R: Route> Transport<R> {
    pub fn new(route: R) -> Self {
        Self::with_config(route, TransportConfig::default())
    }

    pub fn with_config(route: R, config: TransportConfig) -> Self {
        Self {
            route,
            shared: Arc::new(Shared {
                config,
                table: RwLock::new(RoutingTable::new()),
                participants: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn route(&self) -> &R {
        &self.route
    }

    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    // --- Dispatch ---

    /// Submit an event to every handler in its bucket, highest priority
    /// first.
    ///
    /// A cancelled event is only seen by handlers that ignore cancellation.
    /// The flag is checked before each handler, so cancelling affects only
    /// the handlers after the one that cancelled.
    pub fn submit(&self, event: &mut (dyn Event + 'static)) -> Result<Dispatch> {
        if !self.route.should_accept(event) {
            trace!(transport = %self.name(), event = event.event_name(), "event rejected");
            return Ok(Dispatch::Rejected);
        }

        let key = self.route.digest(event);
        let bucket = self.shared.table.read().snapshot(&key);
        let Some(bucket) = bucket else {
            trace!(transport = %self.name(), key = %key, "no handlers for event");
            return Ok(Dispatch::Unrouted { key });
        };

        trace!(transport = %self.name(), key = %key, handlers = bucket.len(), "dispatching event");

        let event_type = event.as_any().type_id();
        let mut invoked = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for registration in bucket.iter() {
            if !registration.takes(event_type) {
                trace!(key = %key, id = %registration.id, "handler takes another event type");
                continue;
            }
            if !registration.ignore_cancelled && event.is_cancelled() {
                trace!(key = %key, id = %registration.id, "event cancelled, skipping handler");
                skipped += 1;
                continue;
            }

            invoked += 1;
            if let Err(source) = registration.handler.handle(event) {
                match self.shared.config.fault_policy {
                    FaultPolicy::FailFast => return Err(TransportError::Handler { key, source }),
                    FaultPolicy::Isolate => {
                        error!(
                            transport = %self.name(),
                            key = %key,
                            id = %registration.id,
                            error = %source,
                            "handler failed"
                        );
                        failed += 1;
                    }
                }
            }
        }

        Ok(Dispatch::Delivered {
            key,
            invoked,
            skipped,
            failed,
        })
    }

    // --- Subscriptions ---

    /// Register `handler` for events of type `E`.
    pub fn subscribe<E, H>(&self, handler: H) -> Subscription
    where
        E: Event,
        H: Handler<E>,
    {
        self.subscribe_at::<E, H>(RoutingKey::of::<E>(), handler)
    }

    /// Register `handler` for events of type `E` under `key`. Events of
    /// other types that the route sends to `key` pass it by.
    pub fn subscribe_at<E, H>(&self, key: RoutingKey, handler: H) -> Subscription
    where
        E: Event,
        H: Handler<E>,
    {
        self.register(
            key,
            Some(TypeId::of::<E>()),
            Arc::new(Typed::<E, H>::new(handler)),
        )
    }

    /// Register a closure for events of type `E` with default priority,
    /// skipped once the event is cancelled.
    pub fn on<E, F>(&self, f: F) -> Subscription
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe::<E, _>(FnHandler::new(move |event: &mut E| {
            f(event);
            Ok(())
        }))
    }

    /// Register a handler over `dyn Event` under an arbitrary key.
    pub fn subscribe_key<H>(&self, key: RoutingKey, handler: H) -> Subscription
    where
        H: Handler<dyn Event>,
    {
        self.register(key, None, Arc::new(handler))
    }

    fn register(
        &self,
        key: RoutingKey,
        event_type: Option<TypeId>,
        handler: Arc<dyn Handler<dyn Event>>,
    ) -> Subscription {
        let id = SubscriptionId(self.shared.next_id());
        let registration = Registration::new(id, event_type, handler);
        debug!(
            transport = %self.name(),
            key = %key,
            id = %id,
            priority = %registration.priority,
            ignore_cancelled = registration.ignore_cancelled,
            "handler subscribed"
        );
        self.shared.table.write().insert(key, registration);

        let shared = Arc::downgrade(&self.shared);
        Subscription::with_closer(Box::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.unregister(&key, id);
            }
            Ok(())
        }))
    }

    /// Number of handlers registered under `key`.
    pub fn handler_count(&self, key: &RoutingKey) -> usize {
        self.shared.table.read().handler_count(key)
    }

    /// Number of handlers registered for events of type `E`.
    pub fn handler_count_for<E: Event>(&self) -> usize {
        self.handler_count(&RoutingKey::of::<E>())
    }

    // --- Participants ---

    /// Register a participant's batch of handlers.
    ///
    /// Fails with [`TransportError::DuplicateParticipant`] if the same
    /// participant is already registered.
    pub fn participate<P>(&self, participant: &Arc<P>) -> Result<Participation>
    where
        P: Participant<R>,
    {
        let key = ParticipantKey::of(participant);
        let name = std::any::type_name::<P>();
        let duplicate = || TransportError::DuplicateParticipant { participant: name };

        if self.shared.participants.lock().contains_key(&key) {
            return Err(duplicate());
        }

        // No lock is held while the participant subscribes.
        let subscriptions = participant.subscribe(self);
        let count = subscriptions.len();
        let generation = self.shared.next_id();

        let mut participants = self.shared.participants.lock();
        if participants.contains_key(&key) {
            drop(participants);
            drop(subscriptions);
            return Err(duplicate());
        }
        let pinned: Arc<dyn Any + Send + Sync> = participant.clone();
        participants.insert(
            key,
            Enrollment {
                _participant: pinned,
                generation,
                subscriptions,
            },
        );
        drop(participants);

        debug!(transport = %self.name(), participant = name, subscriptions = count, "participant joined");

        let shared = Arc::downgrade(&self.shared);
        let subscription = Subscription::with_closer(Box::new(move || match shared.upgrade() {
            Some(shared) => shared.withdraw(key, Some(generation)).map(|_| ()),
            None => Ok(()),
        }));
        Ok(Participation::new(name, subscription))
    }

    /// Close every subscription registered for `participant`. Returns how
    /// many were released; withdrawing an absent participant releases none.
    ///
    /// The first close failure is returned. Subscriptions already closed
    /// stay closed and the rest are closed anyway.
    pub fn withdraw<P: ?Sized>(&self, participant: &Arc<P>) -> Result<usize> {
        self.shared.withdraw(ParticipantKey::of(participant), None)
    }

    pub fn is_participating<P: ?Sized>(&self, participant: &Arc<P>) -> bool {
        self.shared
            .participants
            .lock()
            .contains_key(&ParticipantKey::of(participant))
    }

    pub fn participant_count(&self) -> usize {
        self.shared.participants.lock().len()
    }
}

impl Default for Transport<ExactType> {
    fn default() -> Self {
        Self::new(ExactType)
    }
}

impl<R: Route + fmt::Debug> fmt::Debug for Transport<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("name", &self.name())
            .field("route", &self.route)
            .field("buckets", &self.shared.table.read().bucket_count())
            .field("participants", &self.participant_count())
            .finish()
    }
}
