//! Presence and delivery registry.
//!
//! Maps each authenticated identity to its single live connection and back.
//! Both maps sit behind one mutex so the pair is always consistent, and
//! broadcasts are emitted while the lock is held so clients observe
//! `online_users` snapshots in mutation order. Emits never block.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::events::ServerEvent;
use super::transport::Transport;
use super::ConnectionId;

#[derive(Default)]
struct Maps {
    by_identity: HashMap<String, ConnectionId>,
    by_connection: HashMap<ConnectionId, String>,
}

impl Maps {
    fn online(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.by_identity.keys().cloned().collect();
        ids.sort();
        ids
    }
}

pub struct ConnectionRegistry {
    maps: Mutex<Maps>,
    transport: Arc<dyn Transport>,
}

impl ConnectionRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            maps: Mutex::new(Maps::default()),
            transport,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Maps> {
        // Every mutation leaves both maps consistent before it can panic,
        // so a poisoned lock still guards valid state.
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind `identity_id` to `connection`, replacing any earlier connection
    /// for that identity, then broadcast the online set.
    pub fn register(&self, connection: ConnectionId, identity_id: &str) {
        let mut maps = self.lock();

        if let Some(previous) = maps.by_identity.remove(identity_id) {
            maps.by_connection.remove(&previous);
            tracing::debug!(
                user_id = %identity_id,
                connection_id = %previous,
                "Superseded by newer connection"
            );
        }
        if let Some(owner) = maps.by_connection.remove(&connection) {
            maps.by_identity.remove(&owner);
        }

        maps.by_identity.insert(identity_id.to_string(), connection.clone());
        maps.by_connection.insert(connection.clone(), identity_id.to_string());

        tracing::debug!(
            user_id = %identity_id,
            connection_id = %connection,
            online = maps.by_identity.len(),
            "Connection registered"
        );

        self.broadcast_online_identities(&maps);
    }

    /// Drop `connection` from both maps if it is registered, then broadcast
    /// the online set.
    pub fn unregister(&self, connection: &ConnectionId) {
        let mut maps = self.lock();

        match maps.by_connection.remove(connection) {
            Some(identity_id) => {
                maps.by_identity.remove(&identity_id);
                tracing::debug!(
                    user_id = %identity_id,
                    connection_id = %connection,
                    "Connection unregistered"
                );
            }
            None => {
                tracing::debug!(connection_id = %connection, "Unregister of unknown connection");
            }
        }

        self.broadcast_online_identities(&maps);
    }

    /// Emit `event` to the recipient's live connection. Returns false when
    /// the recipient is offline; nothing is queued in that case.
    pub fn deliver(&self, recipient_id: &str, event: &ServerEvent) -> bool {
        let connection = self.lock().by_identity.get(recipient_id).cloned();
        match connection {
            Some(connection) => self.transport.emit_to(&connection, event),
            None => false,
        }
    }

    /// Emit the full online set to every connection. Takes the held guard
    /// so the snapshot cannot interleave with another mutation.
    fn broadcast_online_identities(&self, maps: &Maps) {
        self.transport.emit_all(&ServerEvent::OnlineUsers(maps.online()));
    }

    /// Sorted ids of identities with a live connection.
    pub fn online_identities(&self) -> Vec<String> {
        self.lock().online()
    }

    #[cfg(test)]
    fn connection_for(&self, identity_id: &str) -> Option<ConnectionId> {
        self.lock().by_identity.get(identity_id).cloned()
    }

    #[cfg(test)]
    fn identity_for(&self, connection: &ConnectionId) -> Option<String> {
        self.lock().by_connection.get(connection).cloned()
    }
}
