//! TCP connection to the relay, with a background reader task.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{Connection, ConnectionConfig, ConnectionId, FramedQueue, LinkStatus, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP connection to the relay.
///
/// Lifecycle: [`connect`](Self::connect) → [`start`](Self::start) →
/// [`Connection::stop`]. Sends are allowed as soon as the socket is
/// connected; received lines are only buffered after `start`.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    config: ConnectionConfig,
    writer: Mutex<OwnedWriteHalf>,
    /// Read half, handed to the reader task by `start`.
    reader: Option<OwnedReadHalf>,
    status_tx: Option<watch::Sender<LinkStatus>>,
    status_rx: watch::Receiver<LinkStatus>,
    link: Option<ReaderLink>,
}

/// Everything shared between the connection and its reader task.
struct ReaderLink {
    queue: Arc<FramedQueue>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TcpConnection {
    /// Resolves `host:port` and connects to the first address that accepts.
    ///
    /// Every resolved address is tried in order, each bounded by
    /// `config.connect_timeout`.
    ///
    /// # Errors
    /// [`TransportError::Resolve`] if the name does not resolve,
    /// [`TransportError::ConnectFailed`] if no address accepts.
    pub async fn connect(
        host: &str,
        port: u16,
        config: ConnectionConfig,
    ) -> Result<Self, TransportError> {
        let config = config.validated();
        let target = format!("{host}:{port}");

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| TransportError::Resolve {
                target: target.clone(),
                source,
            })?
            .collect();

        for addr in &addrs {
            debug!(%addr, "attempting to connect");
            match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => return Ok(Self::from_stream(stream, config)),
                Ok(Err(e)) => warn!(%addr, error = %e, "connect failed"),
                Err(_) => warn!(%addr, timeout = ?config.connect_timeout, "connect timed out"),
            }
        }

        Err(TransportError::ConnectFailed {
            target,
            attempts: addrs.len(),
        })
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream, config: ConnectionConfig) -> Self {
        let config = config.validated();
        if let Err(e) = stream.set_nodelay(config.nodelay) {
            warn!(error = %e, "failed to set TCP_NODELAY");
        }
        let peer = stream.peer_addr().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
        let (reader, writer) = stream.into_split();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Idle);

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        info!(%id, %peer, "connected to relay");

        Self {
            id,
            peer,
            config,
            writer: Mutex::new(writer),
            reader: Some(reader),
            status_tx: Some(status_tx),
            status_rx,
            link: None,
        }
    }

    /// The relay's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Allocates the framed queue and spawns the reader task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// [`TransportError::AlreadyStarted`] on a second call.
    pub fn start(&mut self) -> Result<(), TransportError> {
        let (Some(reader), Some(status)) = (self.reader.take(), self.status_tx.take()) else {
            return Err(TransportError::AlreadyStarted);
        };

        let queue = Arc::new(FramedQueue::with_capacity(self.config.queue_capacity));
        let running = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());
        status.send_replace(LinkStatus::Running);

        let handle = tokio::spawn(read_loop(
            ReadTask {
                id: self.id,
                reader,
                queue: Arc::clone(&queue),
                running: Arc::clone(&running),
                shutdown: Arc::clone(&shutdown),
                chunk_size: self.config.recv_chunk_size,
            },
            status,
        ));

        debug!(id = %self.id, "reader started");
        self.link = Some(ReaderLink {
            queue,
            running,
            shutdown,
            handle,
        });
        Ok(())
    }
}

impl Connection for TcpConnection {
    async fn send_all(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        match tokio::time::timeout(self.config.send_timeout, write_fully(&mut writer, data)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::SendTimeout(self.config.send_timeout)),
        }
    }

    fn take_complete(&self) -> Option<Vec<u8>> {
        self.link.as_ref()?.queue.take_complete()
    }

    fn status(&self) -> LinkStatus {
        self.status_rx.borrow().clone()
    }

    async fn stop(mut self) -> Result<(), TransportError> {
        let link = self.link.take();

        if let Some(link) = &link {
            // Flag first, then close: the reader treats EOF as intentional
            // only when the flag is already down.
            link.running.store(false, Ordering::Release);
            link.shutdown.notify_one();
        }
        if let Err(e) = self.writer.lock().await.shutdown().await {
            debug!(id = %self.id, error = %e, "socket shutdown failed");
        }

        if let Some(link) = link {
            link.handle
                .await
                .map_err(|e| TransportError::ReaderTask(e.to_string()))?;
        }

        info!(id = %self.id, "connection stopped");
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Writes all of `data`, looping over short writes.
async fn write_fully(writer: &mut OwnedWriteHalf, data: &[u8]) -> Result<(), TransportError> {
    let mut sent = 0;
    while sent < data.len() {
        let n = writer.write(&data[sent..]).await.map_err(TransportError::SendFailed)?;
        if n == 0 {
            return Err(TransportError::SendFailed(io::Error::from(io::ErrorKind::WriteZero)));
        }
        sent += n;
    }
    Ok(())
}

struct ReadTask {
    id: ConnectionId,
    reader: OwnedReadHalf,
    queue: Arc<FramedQueue>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    chunk_size: usize,
}

async fn read_loop(mut task: ReadTask, status: watch::Sender<LinkStatus>) {
    let final_status = match receive(&mut task).await {
        Ok(()) => {
            debug!(id = %task.id, "reader exited");
            LinkStatus::Stopped
        }
        Err(e) => {
            error!(id = %task.id, error = %e, "reader failed");
            LinkStatus::Failed(e.to_string())
        }
    };
    status.send_replace(final_status);
}

async fn receive(task: &mut ReadTask) -> Result<(), TransportError> {
    let mut buf = vec![0u8; task.chunk_size];

    loop {
        // The blocking wait happens here, outside the queue lock.
        let read = tokio::select! {
            r = task.reader.read(&mut buf) => r,
            () = task.shutdown.notified() => return Ok(()),
        };

        let n = match read {
            Ok(0) | Err(_) if !task.running.load(Ordering::Acquire) => {
                return Ok(());
            }
            Ok(0) => {
                return Err(TransportError::ConnectionClosed("relay closed the stream".into()));
            }
            Err(e) => return Err(TransportError::ReceiveFailed(e)),
            Ok(n) => n,
        };

        tokio::select! {
            r = task.queue.append(&buf[..n]) => r?,
            () = task.shutdown.notified() => return Ok(()),
        }
    }
}
