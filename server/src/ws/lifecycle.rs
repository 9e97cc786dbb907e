//! Per-connection lifecycle.
//!
//! `Connecting -> Authenticating -> {Authenticated | Rejected}`, then
//! `Authenticated -> Registered` once the registry has bound the connection,
//! and `-> Unregistered` on disconnect. `Rejected` and `Unregistered` are
//! terminal; a reconnecting client gets a new connection id.

use thiserror::Error;

use super::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Authenticating,
    Authenticated,
    Registered,
    Rejected,
    Unregistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    HandshakeReceived,
    Authenticated,
    AuthFailed,
    Registered,
    Disconnected,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid transition from {from:?} on {event:?}")]
pub struct InvalidTransition {
    pub from: ConnectionPhase,
    pub event: LifecycleEvent,
}

impl ConnectionPhase {
    pub fn next(self, event: LifecycleEvent) -> Result<Self, InvalidTransition> {
        use LifecycleEvent as E;

        match (self, event) {
            (Self::Connecting, E::HandshakeReceived) => Ok(Self::Authenticating),
            (Self::Authenticating, E::Authenticated) => Ok(Self::Authenticated),
            (Self::Authenticating, E::AuthFailed) => Ok(Self::Rejected),
            (Self::Authenticated, E::Registered) => Ok(Self::Registered),
            // Upgrade dropped before the actor got to register
            (Self::Authenticated, E::Disconnected) => Ok(Self::Unregistered),
            (Self::Registered, E::Disconnected) => Ok(Self::Unregistered),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionPhase::Rejected | ConnectionPhase::Unregistered)
    }
}

/// Tracks one connection's phase and logs each step.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    connection_id: ConnectionId,
    phase: ConnectionPhase,
}

impl ConnectionLifecycle {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            phase: ConnectionPhase::Connecting,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn advance(&mut self, event: LifecycleEvent) -> Result<ConnectionPhase, InvalidTransition> {
        let next = self.phase.next(event)?;
        tracing::debug!(
            connection_id = %self.connection_id,
            from = ?self.phase,
            to = ?next,
            terminal = next.is_terminal(),
            "Connection phase changed"
        );
        self.phase = next;
        Ok(next)
    }

    /// Advance, logging a rejected transition at warn. The phase is left
    /// unchanged when the transition is invalid.
    pub fn record(&mut self, event: LifecycleEvent) -> bool {
        match self.advance(event) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(connection_id = %self.connection_id, error = %e, "Lifecycle violation");
                false
            }
        }
    }
}
