//! Property tests for dispatch order.

use event_transport::{
    Cancellable, Event, FnHandler, GlobalTransport, Priority, Subscription,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

struct Signal {
    cancelled: bool,
}

impl Cancellable for Signal {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

impl Event for Signal {
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        Some(self)
    }
}

fn priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn register(
    transport: &GlobalTransport,
    handlers: &[(Priority, bool)],
    seen: &Arc<Mutex<Vec<usize>>>,
) -> Vec<Subscription> {
    handlers
        .iter()
        .enumerate()
        .map(|(index, &(priority, ignore_cancelled))| {
            let seen = Arc::clone(seen);
            let mut handler = FnHandler::new(move |_: &mut Signal| {
                seen.lock().push(index);
                Ok(())
            })
            .with_priority(priority);
            if ignore_cancelled {
                handler = handler.ignoring_cancelled();
            }
            transport.subscribe::<Signal, _>(handler)
        })
        .collect()
}

/// Registration indices in the order dispatch should visit them.
fn expected_order(handlers: &[(Priority, bool)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..handlers.len()).collect();
    order.sort_by_key(|&index| handlers[index].0);
    order
}

proptest! {
    #[test]
    fn prop_dispatch_follows_priority_then_registration(
        handlers in prop::collection::vec((priority(), any::<bool>()), 0..24)
    ) {
        let transport = GlobalTransport::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _subs = register(&transport, &handlers, &seen);

        transport.submit(&mut Signal { cancelled: false }).unwrap();

        prop_assert_eq!(seen.lock().clone(), expected_order(&handlers));
    }

    #[test]
    fn prop_cancelled_event_reaches_only_opted_in(
        handlers in prop::collection::vec((priority(), any::<bool>()), 0..24)
    ) {
        let transport = GlobalTransport::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _subs = register(&transport, &handlers, &seen);

        let dispatch = transport.submit(&mut Signal { cancelled: true }).unwrap();

        let expected: Vec<usize> = expected_order(&handlers)
            .into_iter()
            .filter(|&index| handlers[index].1)
            .collect();
        prop_assert_eq!(dispatch.invoked(), expected.len());
        prop_assert_eq!(seen.lock().clone(), expected);
    }

    #[test]
    fn prop_closed_subscriptions_never_fire(
        handlers in prop::collection::vec((priority(), any::<bool>()), 1..16),
        close_mask in prop::collection::vec(any::<bool>(), 16)
    ) {
        let transport = GlobalTransport::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs = register(&transport, &handlers, &seen);

        for (subscription, &close) in subs.iter().zip(&close_mask) {
            if close {
                subscription.close().unwrap();
            }
        }

        transport.submit(&mut Signal { cancelled: false }).unwrap();

        let expected: Vec<usize> = expected_order(&handlers)
            .into_iter()
            .filter(|&index| !close_mask[index])
            .collect();
        prop_assert_eq!(seen.lock().clone(), expected);
    }
}
