//! Routing table: routing key to priority-ordered handler bucket.

use crate::handlers::Handler;
use crate::types::{Event, Priority, RoutingKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of one handler registration within a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handler together with the attributes it was registered with.
#[derive(Clone)]
pub(crate) struct Registration {
    pub id: SubscriptionId,
    pub priority: Priority,
    pub ignore_cancelled: bool,
    /// Concrete event type the handler takes; `None` takes any event.
    pub event_type: Option<TypeId>,
    pub handler: Arc<dyn Handler<dyn Event>>,
}

impl Registration {
    pub fn new(
        id: SubscriptionId,
        event_type: Option<TypeId>,
        handler: Arc<dyn Handler<dyn Event>>,
    ) -> Self {
        Self {
            id,
            priority: handler.priority(),
            ignore_cancelled: handler.ignore_cancelled(),
            event_type,
            handler,
        }
    }

    /// Whether an event of runtime type `event_type` reaches this handler.
    pub fn takes(&self, event_type: TypeId) -> bool {
        self.event_type.map_or(true, |expected| expected == event_type)
    }
}

/// What `remove` took out of the table. Dropping it may drop a handler, and
/// with it any subscriptions the handler owns, so callers drop it only
/// after releasing the table lock.
#[must_use]
#[allow(dead_code)]
pub(crate) enum Removed {
    Entry(Registration),
    Bucket(Arc<Vec<Registration>>),
}

/// Buckets are copy-on-write so dispatch can hold a snapshot without
/// holding the table lock.
#[derive(Default)]
pub(crate) struct RoutingTable {
    buckets: HashMap<RoutingKey, Arc<Vec<Registration>>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every registration of the same or higher priority.
    pub fn insert(&mut self, key: RoutingKey, registration: Registration) {
        let bucket = Arc::make_mut(self.buckets.entry(key).or_default());
        let at = bucket.partition_point(|r| r.priority <= registration.priority);
        bucket.insert(at, registration);
    }

    /// Remove one registration. Returns `None` if it was not present.
    pub fn remove(&mut self, key: &RoutingKey, id: SubscriptionId) -> Option<Removed> {
        let bucket = self.buckets.get_mut(key)?;
        let position = bucket.iter().position(|r| r.id == id)?;

        if bucket.len() == 1 {
            self.buckets.remove(key).map(Removed::Bucket)
        } else {
            Some(Removed::Entry(Arc::make_mut(bucket).remove(position)))
        }
    }

    /// Current bucket for `key`, in dispatch order.
    pub fn snapshot(&self, key: &RoutingKey) -> Option<Arc<Vec<Registration>>> {
        self.buckets.get(key).cloned()
    }

    pub fn handler_count(&self, key: &RoutingKey) -> usize {
        self.buckets.get(key).map_or(0, |bucket| bucket.len())
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FnHandler;

    struct Tick;
    impl Event for Tick {}

    fn registration(id: u64, priority: Priority) -> Registration {
        let handler = FnHandler::<dyn Event, _>::new(|_| Ok(())).with_priority(priority);
        Registration::new(SubscriptionId(id), None, Arc::new(handler))
    }

    fn ids(table: &RoutingTable, key: &RoutingKey) -> Vec<u64> {
        table
            .snapshot(key)
            .map(|bucket| bucket.iter().map(|r| r.id.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_insert_orders_by_priority() {
        let key = RoutingKey::of::<Tick>();
        let mut table = RoutingTable::new();

        table.insert(key, registration(1, Priority::Lowest));
        table.insert(key, registration(2, Priority::Normal));
        table.insert(key, registration(3, Priority::Highest));
        table.insert(key, registration(4, Priority::High));

        assert_eq!(ids(&table, &key), vec![3, 4, 2, 1]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let key = RoutingKey::of::<Tick>();
        let mut table = RoutingTable::new();

        table.insert(key, registration(1, Priority::Normal));
        table.insert(key, registration(2, Priority::High));
        table.insert(key, registration(3, Priority::Normal));
        table.insert(key, registration(4, Priority::Normal));

        assert_eq!(ids(&table, &key), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_remove_drops_empty_bucket() {
        let key = RoutingKey::of::<Tick>();
        let mut table = RoutingTable::new();
        table.insert(key, registration(1, Priority::Normal));
        table.insert(key, registration(2, Priority::Normal));

        assert!(matches!(table.remove(&key, SubscriptionId(1)), Some(Removed::Entry(_))));
        assert!(table.remove(&key, SubscriptionId(1)).is_none());
        assert_eq!(table.handler_count(&key), 1);

        assert!(matches!(table.remove(&key, SubscriptionId(2)), Some(Removed::Bucket(_))));
        assert_eq!(table.bucket_count(), 0);
        assert!(table.snapshot(&key).is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_changes() {
        let key = RoutingKey::of::<Tick>();
        let mut table = RoutingTable::new();
        table.insert(key, registration(1, Priority::Normal));
        table.insert(key, registration(2, Priority::Normal));

        let snapshot = table.snapshot(&key).unwrap();
        let _removed = table.remove(&key, SubscriptionId(1));
        table.insert(key, registration(3, Priority::Highest));

        assert_eq!(snapshot.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ids(&table, &key), vec![3, 2]);
    }

    #[test]
    fn test_remove_from_unknown_key() {
        let mut table = RoutingTable::new();
        assert!(table.remove(&RoutingKey::tag("missing"), SubscriptionId(7)).is_none());
    }

    #[test]
    fn test_typed_registration_takes_only_its_type() {
        struct Tock;
        impl Event for Tock {}

        let handler = FnHandler::<dyn Event, _>::new(|_| Ok(()));
        let typed =
            Registration::new(SubscriptionId(1), Some(TypeId::of::<Tick>()), Arc::new(handler));
        assert!(typed.takes(TypeId::of::<Tick>()));
        assert!(!typed.takes(TypeId::of::<Tock>()));

        let any = registration(2, Priority::Normal);
        assert!(any.takes(TypeId::of::<Tock>()));
    }
}
