use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use workerchain::events::{EventBus, LifecycleEvent};

/// Records every event of a bus until it completes.
///
/// Create it before the launcher starts; [`EventRecorder::finish`] waits for
/// bus completion and returns the events in delivery order.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
    handle: JoinHandle<()>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let mut subscription = bus.subscribe();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                sink.lock().unwrap().push(event);
            }
        });

        Self { events, handle }
    }

    /// Events recorded so far.
    pub fn snapshot(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub async fn finish(self) -> Vec<LifecycleEvent> {
        self.handle.await.expect("recorder task panicked");
        let events = self.events.lock().unwrap();
        events.clone()
    }
}

/// Concatenate all `Data` payloads.
pub fn collect_data(events: &[LifecycleEvent]) -> String {
    let bytes: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            LifecycleEvent::Data(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// All `Message` payloads.
pub fn collect_messages(events: &[LifecycleEvent]) -> Vec<serde_json::Value> {
    events
        .iter()
        .filter_map(|e| match e {
            LifecycleEvent::Message(value) => Some(value.clone()),
            _ => None,
        })
        .collect()
}
