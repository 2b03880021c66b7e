// tests/bus_properties.rs

use proptest::prelude::*;
use serde_json::json;

use workerchain::events::{EventBus, EventKind, LifecycleEvent};

// Arbitrary lifecycle events, terminal ones included, so that sequences often
// contain events published after completion.
fn event_strategy() -> impl Strategy<Value = LifecycleEvent> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..8).prop_map(LifecycleEvent::Data),
        any::<Option<i32>>().prop_map(|code| LifecycleEvent::Close { code }),
        Just(LifecycleEvent::Disconnect),
        any::<Option<i32>>().prop_map(|code| LifecycleEvent::Exit { code }),
        any::<u16>().prop_map(|n| LifecycleEvent::Message(json!({ "n": n }))),
    ]
}

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    proptest::sample::select(EventKind::ALL.to_vec())
}

fn drain(bus: &EventBus, events: Vec<LifecycleEvent>, kind: Option<EventKind>) -> Vec<LifecycleEvent> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    rt.block_on(async {
        let mut view = match kind {
            Some(kind) => bus.subscribe_kind(kind),
            None => bus.subscribe(),
        };
        for event in events {
            bus.publish(event);
        }
        // Complete the bus in case the sequence had no terminal event.
        bus.publish(LifecycleEvent::Close { code: None });

        let mut received = Vec::new();
        while let Some(event) = view.recv().await {
            received.push(event);
        }
        received
    })
}

/// Everything up to and including the first terminal event.
fn accepted_prefix(events: &[LifecycleEvent]) -> Vec<LifecycleEvent> {
    let mut out = Vec::new();
    for event in events {
        out.push(event.clone());
        if event.is_terminal() {
            return out;
        }
    }
    out.push(LifecycleEvent::Close { code: None });
    out
}

proptest! {
    #[test]
    fn nothing_is_delivered_after_the_first_terminal_event(
        events in proptest::collection::vec(event_strategy(), 0..32)
    ) {
        let bus = EventBus::new(64);
        let received = drain(&bus, events.clone(), None);

        prop_assert_eq!(&received, &accepted_prefix(&events));
        prop_assert_eq!(received.iter().filter(|e| e.is_terminal()).count(), 1);
        prop_assert!(received.last().is_some_and(|e| e.is_terminal()));
    }

    #[test]
    fn filtered_views_see_the_matching_subsequence(
        events in proptest::collection::vec(event_strategy(), 0..32),
        kind in kind_strategy(),
    ) {
        let bus = EventBus::new(64);
        let received = drain(&bus, events.clone(), Some(kind));

        let expected: Vec<LifecycleEvent> = accepted_prefix(&events)
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect();
        prop_assert_eq!(received, expected);
    }
}
