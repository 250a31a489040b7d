//! Client broadcast hub
//!
//! Tracks currently-connected remote clients and fans push messages out to
//! all of them. Delivery runs over a broadcast channel: each connection task
//! subscribes and forwards to its own socket, so one dead subscriber never
//! affects the others and never raises to the broadcaster. The hub is
//! constructed once in `main` and handed to whoever needs it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use homewire_core::PushMessage;

const CHANNEL_CAPACITY: usize = 100;

/// Handle to the shared client hub. Cheap to clone.
#[derive(Clone)]
pub struct ClientHub {
    tx: broadcast::Sender<PushMessage>,
    clients: Arc<Mutex<HashSet<String>>>,
}

impl ClientHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            clients: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Track a newly connected client, keyed by its address:port string.
    pub fn register(&self, client: &str) {
        let total = {
            let mut clients = self.clients.lock();
            clients.insert(client.to_string());
            clients.len()
        };
        debug!(client = %client, total, "Client connected");
    }

    /// Stop tracking a client. Called by the connection's own task on
    /// close or error, never by the broadcaster.
    pub fn unregister(&self, client: &str) {
        let total = {
            let mut clients = self.clients.lock();
            clients.remove(client);
            clients.len()
        };
        debug!(client = %client, total, "Client disconnected");
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Subscribe to push messages; one receiver per connection task.
    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }

    /// Fan a push message out to every subscriber. Best-effort: with no
    /// clients connected the message is dropped.
    pub fn broadcast(&self, message: PushMessage) {
        let _ = self.tx.send(message);
    }
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}
