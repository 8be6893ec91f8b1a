/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host name could not be resolved.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// No resolved address accepted a connection.
    #[error("failed to connect to {target} ({attempts} address(es) tried)")]
    ConnectFailed { target: String, attempts: usize },

    /// Sending data failed. Nothing is known about how much was delivered.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The send did not complete within the configured timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(std::time::Duration),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The connection was closed by the peer.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// A single chunk can never fit in the queue.
    #[error("chunk of {len} bytes exceeds queue capacity of {capacity}")]
    FrameTooLarge { len: usize, capacity: usize },

    /// The queue is full and holds no complete line, so it can never drain.
    #[error("queue overflow: {capacity} bytes buffered without a line separator")]
    QueueOverflow { capacity: usize },

    /// The queue is full right now; retry after the consumer drains it.
    #[error("queue full ({len}/{capacity} bytes)")]
    QueueFull { len: usize, capacity: usize },

    /// `start` was called twice.
    #[error("connection already started")]
    AlreadyStarted,

    /// The reader task panicked or was cancelled.
    #[error("reader task failed: {0}")]
    ReaderTask(String),
}

impl TransportError {
    /// Returns `true` if retrying the same append later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}
