//! Transport layer for Squirrel.
//!
//! Provides the [`Connection`] trait the game loop talks to, the TCP
//! implementation ([`TcpConnection`]) with its background reader task, and
//! the [`FramedQueue`] that turns the received byte stream into whole lines.
//!
//! ```text
//! socket ─▶ reader task ─▶ FramedQueue::append
//!                                 │
//! game loop ◀─ take_complete ◀────┘
//! game loop ─▶ send_all ─▶ socket
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod queue;
mod tcp;

pub use config::ConnectionConfig;
pub use error::TransportError;
pub use queue::{FramedQueue, SEPARATOR};
pub use tcp::TcpConnection;

use std::fmt;

/// Default relay port.
pub const DEFAULT_PORT: u16 = 3490;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// State of the background reader, as seen by the game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Connected but the reader has not been started.
    Idle,
    /// The reader is receiving.
    Running,
    /// The reader exited because `stop` was called.
    Stopped,
    /// The reader hit a receive error or EOF it did not ask for.
    Failed(String),
}

impl LinkStatus {
    /// Returns `true` if the link died without being stopped.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A live stream connection to the relay.
///
/// Implementations own a [`FramedQueue`] fed by a background reader and
/// expose whole lines through [`take_complete`](Self::take_complete).
pub trait Connection: Send + Sync + 'static {
    /// Transmits all of `data` or reports failure. Never partially succeeds.
    async fn send_all(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Takes every complete line received so far. `None` if there is none.
    fn take_complete(&self) -> Option<Vec<u8>>;

    /// Current reader status.
    fn status(&self) -> LinkStatus;

    /// Stops the reader, closes the socket, and releases the queue.
    ///
    /// Consumes the connection: it cannot be reused afterwards.
    async fn stop(self) -> Result<(), TransportError>
    where
        Self: Sized;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_link_status_is_failed() {
        assert!(LinkStatus::Failed("reset".into()).is_failed());
        assert!(!LinkStatus::Stopped.is_failed());
        assert!(!LinkStatus::Running.is_failed());
    }
}
