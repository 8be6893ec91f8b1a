//! Bounded byte queue that only ever hands out whole lines.
//!
//! The reader task appends raw socket chunks; the game loop takes every
//! complete line at once. At any moment the buffer holds zero or more
//! `\n`-terminated lines followed by at most one unterminated tail.
//!
//! ```text
//! |P,0,1.00,2.00\nR,1,3\nT,0,1,|
//!  ^- take_complete returns   ^- tail kept for the next call
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::TransportError;

/// The line separator that delimits frames.
pub const SEPARATOR: u8 = b'\n';

/// A bounded, lock-guarded byte queue shared by one producer and one consumer.
///
/// The lock is held for the whole of an append or a take and never across an
/// `.await`. A producer that finds the queue full waits on a [`Notify`] that
/// [`take_complete`](Self::take_complete) signals after it frees space.
#[derive(Debug)]
pub struct FramedQueue {
    buf: Mutex<Vec<u8>>,
    capacity: usize,
    space: Notify,
}

impl FramedQueue {
    /// Default capacity: 1 MiB.
    pub const DEFAULT_CAPACITY: usize = 1 << 20;

    /// Creates an empty queue holding at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Mutex::new(Vec::with_capacity(capacity.min(64 * 1024))),
            capacity,
            space: Notify::new(),
        }
    }

    /// Maximum number of buffered bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered bytes, complete lines and tail together.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Appends all of `chunk` if it fits right now, or nothing.
    ///
    /// # Errors
    /// - [`TransportError::QueueFull`] if the chunk does not fit yet but will
    ///   once the consumer drains the buffered lines.
    /// - [`TransportError::QueueOverflow`] if it does not fit and the buffer
    ///   holds no separator, so nothing can ever be drained.
    /// - [`TransportError::FrameTooLarge`] if the chunk exceeds the capacity.
    pub fn try_append(&self, chunk: &[u8]) -> Result<(), TransportError> {
        if chunk.len() > self.capacity {
            return Err(TransportError::FrameTooLarge {
                len: chunk.len(),
                capacity: self.capacity,
            });
        }

        let mut buf = self.lock();
        if buf.len() + chunk.len() <= self.capacity {
            buf.extend_from_slice(chunk);
            return Ok(());
        }

        if buf.contains(&SEPARATOR) {
            Err(TransportError::QueueFull {
                len: buf.len(),
                capacity: self.capacity,
            })
        } else {
            Err(TransportError::QueueOverflow {
                capacity: self.capacity,
            })
        }
    }

    /// Appends `chunk`, waiting for the consumer to free space if needed.
    ///
    /// Data is never dropped: the call only returns `Ok` once the whole
    /// chunk is buffered. When the whole chunk does not fit, the lines it
    /// completes are buffered first so the consumer can drain them. Fails
    /// without waiting when waiting could never succeed (see
    /// [`try_append`](Self::try_append)).
    pub async fn append(&self, chunk: &[u8]) -> Result<(), TransportError> {
        if chunk.len() > self.capacity {
            return Err(TransportError::FrameTooLarge {
                len: chunk.len(),
                capacity: self.capacity,
            });
        }

        let mut rest = chunk;
        while !rest.is_empty() {
            // Register interest before checking so a drain that happens
            // between the check and the await is not missed.
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.push_lines(rest) {
                Ok(pushed) => rest = &rest[pushed..],
                Err(e) if e.is_transient() => {
                    tracing::trace!(len = rest.len(), "queue full, waiting for drain");
                    notified.await;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Buffers all of `chunk` if it fits, otherwise its longest prefix that
    /// ends on a separator. Returns the number of bytes buffered.
    fn push_lines(&self, chunk: &[u8]) -> Result<usize, TransportError> {
        let mut buf = self.lock();
        let free = self.capacity.saturating_sub(buf.len());
        if chunk.len() <= free {
            buf.extend_from_slice(chunk);
            return Ok(chunk.len());
        }

        if let Some(last) = chunk[..free].iter().rposition(|&b| b == SEPARATOR) {
            buf.extend_from_slice(&chunk[..=last]);
            return Ok(last + 1);
        }

        if buf.contains(&SEPARATOR) {
            Err(TransportError::QueueFull {
                len: buf.len(),
                capacity: self.capacity,
            })
        } else {
            Err(TransportError::QueueOverflow {
                capacity: self.capacity,
            })
        }
    }

    /// Takes every complete line currently buffered.
    ///
    /// Scans backward for the last separator. Everything up to and including
    /// it is returned; the unterminated tail is shifted to the front of the
    /// buffer. Returns `None` when the queue is empty or only holds a
    /// partial line, in which case the buffer is left untouched.
    pub fn take_complete(&self) -> Option<Vec<u8>> {
        let taken = {
            let mut buf = self.lock();
            let last = buf.iter().rposition(|&b| b == SEPARATOR)?;
            buf.drain(..=last).collect::<Vec<u8>>()
        };
        self.space.notify_waiters();
        Some(taken)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A panic while holding the lock cannot leave the Vec in a torn
        // state, so a poisoned lock is still safe to use.
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FramedQueue {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn drain_all(queue: &FramedQueue) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(lines) = queue.take_complete() {
            out.extend_from_slice(&lines);
        }
        out
    }

    #[test]
    fn test_empty_queue_has_nothing_complete() {
        let queue = FramedQueue::with_capacity(64);
        assert!(queue.take_complete().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_partial_only_returns_none_and_is_unchanged() {
        let queue = FramedQueue::with_capacity(64);
        queue.try_append(b"P,0,12.5").unwrap();

        assert!(queue.take_complete().is_none());
        assert_eq!(queue.len(), 8);

        // The tail is still there and completes later.
        queue.try_append(b"0,34.00\n").unwrap();
        assert_eq!(queue.take_complete().unwrap(), b"P,0,12.50,34.00\n");
    }

    #[test]
    fn test_single_complete_message_leaves_queue_empty() {
        let queue = FramedQueue::with_capacity(64);
        queue.try_append(b"R,1,3\n").unwrap();

        assert_eq!(queue.take_complete().unwrap(), b"R,1,3\n");
        assert!(queue.is_empty());
        assert!(queue.take_complete().is_none());
    }

    #[test]
    fn test_take_keeps_trailing_partial() {
        let queue = FramedQueue::with_capacity(64);
        queue.try_append(b"A,1\nA,2\nO,").unwrap();

        assert_eq!(queue.take_complete().unwrap(), b"A,1\nA,2\n");
        assert_eq!(queue.len(), 2);

        queue.try_append(b"1\n").unwrap();
        assert_eq!(queue.take_complete().unwrap(), b"O,1\n");
    }

    #[test]
    fn test_chunk_boundaries_never_change_output() {
        let stream: &[u8] =
            b"P,0,12.50,34.00\nR,1,3\nT,1,2,3,10.00,20.00\nK,lobby full, sorry\nA,0\n";

        let whole = FramedQueue::with_capacity(256);
        whole.try_append(stream).unwrap();
        let expected = drain_all(&whole);
        assert_eq!(expected, stream);

        // Every chunk size, with a drain between each append.
        for chunk_size in 1..=stream.len() {
            let queue = FramedQueue::with_capacity(256);
            let mut got = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                queue.try_append(chunk).unwrap();
                if let Some(lines) = queue.take_complete() {
                    assert_eq!(lines.last(), Some(&SEPARATOR));
                    got.extend_from_slice(&lines);
                }
            }
            got.extend_from_slice(&drain_all(&queue));
            assert_eq!(got, expected, "chunk size {chunk_size}");
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_full_queue_with_lines_is_transient() {
        let queue = FramedQueue::with_capacity(8);
        queue.try_append(b"A,1\nA,").unwrap();

        let err = queue.try_append(b"2\nA,3").unwrap_err();
        assert!(err.is_transient(), "{err}");

        queue.take_complete().unwrap();
        queue.try_append(b"2\nA,3").unwrap();
        assert_eq!(queue.take_complete().unwrap(), b"A,2\n");
    }

    #[test]
    fn test_full_queue_without_separator_overflows() {
        let queue = FramedQueue::with_capacity(4);
        queue.try_append(b"abcd").unwrap();

        let err = queue.try_append(b"e").unwrap_err();
        assert!(matches!(err, TransportError::QueueOverflow { capacity: 4 }));
    }

    #[test]
    fn test_oversized_chunk_is_rejected() {
        let queue = FramedQueue::with_capacity(4);
        let err = queue.try_append(b"too long\n").unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { len: 9, capacity: 4 }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_exact_capacity_fits() {
        let queue = FramedQueue::with_capacity(4);
        queue.try_append(b"A,1\n").unwrap();
        assert_eq!(queue.len(), 4);
    }

    #[tokio::test]
    async fn test_append_waits_until_consumer_drains() {
        let queue = Arc::new(FramedQueue::with_capacity(8));
        queue.try_append(b"A,1\nA,2\n").unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.append(b"A,3\n").await })
        };

        // The producer cannot finish while the queue is full.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.take_complete().unwrap(), b"A,1\nA,2\n");

        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("producer should be woken by the drain")
            .unwrap()
            .unwrap();
        assert_eq!(queue.take_complete().unwrap(), b"A,3\n");
    }

    #[tokio::test]
    async fn test_append_buffers_completed_line_before_waiting() {
        let queue = Arc::new(FramedQueue::with_capacity(16));
        queue.try_append(b"xxxxxxxxxx").unwrap();

        // All at once it does not fit, but the line it finishes does.
        assert!(matches!(
            queue.try_append(b"yy\nzzzzz"),
            Err(TransportError::QueueOverflow { capacity: 16 })
        ));

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.append(b"yy\nzzzzz").await })
        };

        let mut first = None;
        for _ in 0..100 {
            first = queue.take_complete();
            if first.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(first.as_deref(), Some(&b"xxxxxxxxxxyy\n"[..]));

        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("producer should finish once the line is drained")
            .unwrap()
            .unwrap();
        assert_eq!(queue.len(), 5);
        queue.try_append(b"\n").unwrap();
        assert_eq!(queue.take_complete().unwrap(), b"zzzzz\n");
    }

    #[tokio::test]
    async fn test_append_fails_fast_on_overflow() {
        let queue = FramedQueue::with_capacity(4);
        queue.try_append(b"abc").unwrap();
        let err = queue.append(b"de").await.unwrap_err();
        assert!(matches!(err, TransportError::QueueOverflow { .. }));
    }
}
