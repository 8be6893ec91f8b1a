//! Integration tests for the TCP connection against a loopback relay.
//!
//! Each test binds a listener on `127.0.0.1:0`, connects a
//! `TcpConnection` to it, and drives the server side by hand.

use std::time::Duration;

use squirrel_transport::{Connection, ConnectionConfig, LinkStatus, TcpConnection, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Binds a listener and returns it with its port.
async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Connects a client and returns it with the accepted server-side stream.
async fn connected_pair(config: ConnectionConfig) -> (TcpConnection, TcpStream) {
    let (listener, port) = listener().await;
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("should accept");
        stream
    });
    let conn = TcpConnection::connect("127.0.0.1", port, config)
        .await
        .expect("should connect");
    let server = accept.await.unwrap();
    (conn, server)
}

/// Polls `take_complete` until something arrives or the deadline passes.
async fn wait_for_lines(conn: &TcpConnection) -> Vec<u8> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(lines) = conn.take_complete() {
            return lines;
        }
        assert!(tokio::time::Instant::now() < deadline, "no complete line arrived");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn wait_for_status(conn: &TcpConnection, pred: impl Fn(&LinkStatus) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !pred(&conn.status()) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "status never changed, still {:?}",
            conn.status()
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_send_all_delivers_every_byte() {
    let (conn, mut server) = connected_pair(ConnectionConfig::default()).await;

    // Large enough to need several short writes.
    let payload = b"3,P,0,12.50,34.00\n".repeat(4096);
    let len = payload.len();
    let reader = tokio::spawn(async move {
        let mut got = vec![0u8; len];
        server.read_exact(&mut got).await.unwrap();
        got
    });

    conn.send_all(&payload).await.expect("send should succeed");
    let got = reader.await.unwrap();
    assert_eq!(got, payload);
}

#[tokio::test]
async fn test_send_to_reset_peer_fails() {
    let config = ConnectionConfig {
        send_timeout: Duration::from_secs(2),
        ..ConnectionConfig::default()
    };
    let (conn, server) = connected_pair(config).await;

    // Zero linger turns the close into a reset.
    #[allow(deprecated)]
    server.set_linger(Some(Duration::ZERO)).unwrap();
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Far more than the socket buffers hold, so the write cannot complete.
    let payload = vec![b'x'; 16 << 20];
    let mut result = Ok(());
    for _ in 0..4 {
        result = conn.send_all(&payload).await;
        if result.is_err() {
            break;
        }
    }
    let err = result.expect_err("send to a reset peer should fail");
    assert!(
        matches!(err, TransportError::SendFailed(_) | TransportError::SendTimeout(_)),
        "{err}"
    );
}

#[tokio::test]
async fn test_reader_reassembles_split_lines() {
    let (mut conn, mut server) = connected_pair(ConnectionConfig::default()).await;
    conn.start().expect("should start");
    assert_eq!(conn.status(), LinkStatus::Running);

    // Nothing complete before the first separator.
    server.write_all(b"P,0,12.5").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(conn.take_complete().is_none());

    server.write_all(b"0,34.00\nR,1,").await.unwrap();
    assert_eq!(wait_for_lines(&conn).await, b"P,0,12.50,34.00\n");

    server.write_all(b"3\n").await.unwrap();
    assert_eq!(wait_for_lines(&conn).await, b"R,1,3\n");

    conn.stop().await.expect("stop should succeed");
}

#[tokio::test]
async fn test_stop_is_a_clean_shutdown() {
    let (mut conn, _server) = connected_pair(ConnectionConfig::default()).await;
    conn.start().unwrap();

    // The server never closes; stop must still unblock the reader.
    tokio::time::timeout(Duration::from_secs(2), conn.stop())
        .await
        .expect("stop should not hang")
        .expect("stop should succeed");
}

#[tokio::test]
async fn test_peer_close_marks_link_failed() {
    let (mut conn, server) = connected_pair(ConnectionConfig::default()).await;
    conn.start().unwrap();

    drop(server);
    wait_for_status(&conn, LinkStatus::is_failed).await;

    // Stopping a failed link still succeeds.
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let (mut conn, _server) = connected_pair(ConnectionConfig::default()).await;
    conn.start().unwrap();
    assert!(matches!(conn.start(), Err(TransportError::AlreadyStarted)));
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn test_unstarted_connection_has_no_lines() {
    let (conn, mut server) = connected_pair(ConnectionConfig::default()).await;
    server.write_all(b"O,1\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(conn.status(), LinkStatus::Idle);
    assert!(conn.take_complete().is_none());
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    // Bind then drop to get a port nobody listens on.
    let (listener, port) = listener().await;
    drop(listener);

    let err = TcpConnection::connect("127.0.0.1", port, ConnectionConfig::default())
        .await
        .err()
        .expect("connect should fail");
    assert!(matches!(err, TransportError::ConnectFailed { attempts: 1, .. }), "{err}");
}

#[tokio::test]
async fn test_reader_overflow_fails_link() {
    let config = ConnectionConfig {
        recv_chunk_size: 16,
        queue_capacity: 16,
        ..ConnectionConfig::default()
    };
    let (mut conn, mut server) = connected_pair(config).await;
    conn.start().unwrap();

    // 64 bytes with no separator can never be drained from a 16-byte queue.
    server.write_all(&[b'x'; 64]).await.unwrap();
    wait_for_status(&conn, LinkStatus::is_failed).await;
    conn.stop().await.unwrap();
}
