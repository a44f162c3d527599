//! Broadcast fan-out to every registered connection.

use crate::player::ConnectionId;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use super::OutboundEvent;

/// Events a connection may have queued before further events are dropped.
pub const OUTBOX_CAPACITY: usize = 256;

/// Send half of one connection's outbound queue.
pub type Outbox = mpsc::Sender<OutboundEvent>;

/// Create the bounded queue for one connection.
pub fn outbox_channel() -> (Outbox, mpsc::Receiver<OutboundEvent>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// Mapping of connection id to its outbound queue.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    outboxes: HashMap<ConnectionId, Outbox>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the outbox for `id`.
    pub fn register(&mut self, id: ConnectionId, outbox: Outbox) {
        self.outboxes.insert(id, outbox);
    }

    /// Returns true if an entry was removed.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        self.outboxes.remove(&id).is_some()
    }

    #[inline]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.outboxes.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Queue `event` on every registered connection, the originator included.
    ///
    /// Sends never wait on a socket. A connection whose queue is full or
    /// closed misses the event. Returns how many connections accepted it.
    pub fn broadcast(&self, event: &OutboundEvent) -> usize {
        let mut delivered = 0;
        for (id, outbox) in &self.outboxes {
            match outbox.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("Dropped {} for lagging connection {}", event.kind(), id)
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Dropped {} for closed connection {}", event.kind(), id)
                }
            }
        }
        delivered
    }
}
