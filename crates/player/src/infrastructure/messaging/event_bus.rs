//! Fan-out of decoded server events to in-process listeners.
//!
//! The bridge task is the only publisher. It calls [`EventBus::dispatch`]
//! once per event, in the order the socket delivered them, so a listener
//! that forwards into a channel (the runner does this for the session's
//! `ingest`) sees the server's ordering unchanged. Duplicates are not
//! filtered here; the session's event log owns dedup.

use std::sync::Arc;

use argonvale_shared::ServerEvent;
use tokio::sync::Mutex;

type Subscriber = Box<dyn FnMut(ServerEvent) + Send + 'static>;

/// Cloneable handle; all clones share one listener list.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a listener for every event dispatched after this call.
    pub async fn subscribe(&self, callback: impl FnMut(ServerEvent) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Hand `event` to each listener in registration order.
    pub async fn dispatch(&self, event: ServerEvent) {
        let mut subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter_mut() {
            subscriber(event.clone());
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn clear(&self) {
        self.subscribers.lock().await.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
