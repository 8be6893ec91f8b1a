//! Connection tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::FramedQueue;

/// Configuration for a [`TcpConnection`](crate::TcpConnection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Per-address connect timeout.
    pub connect_timeout: Duration,

    /// Upper bound on a single `send_all`.
    pub send_timeout: Duration,

    /// Size of the buffer handed to each socket read.
    pub recv_chunk_size: usize,

    /// Capacity of the framed queue.
    pub queue_capacity: usize,

    /// Disable Nagle's algorithm. Position updates are tiny and frequent.
    pub nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_secs(5),
            recv_chunk_size: 4096,
            queue_capacity: FramedQueue::DEFAULT_CAPACITY,
            nodelay: true,
        }
    }
}

impl ConnectionConfig {
    /// Clamp values so the reader can always make progress.
    ///
    /// - `recv_chunk_size` is at least 1.
    /// - `queue_capacity` is at least `recv_chunk_size`, so one read always
    ///   fits in an empty queue.
    pub fn validated(mut self) -> Self {
        if self.recv_chunk_size == 0 {
            tracing::warn!("recv_chunk_size is 0, using 1");
            self.recv_chunk_size = 1;
        }
        if self.queue_capacity < self.recv_chunk_size {
            tracing::warn!(
                capacity = self.queue_capacity,
                chunk = self.recv_chunk_size,
                "queue_capacity below recv_chunk_size, raising it"
            );
            self.queue_capacity = self.recv_chunk_size;
        }
        self
    }
}
