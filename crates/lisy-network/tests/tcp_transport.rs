//! Integration tests for Connection over real TCP sockets.
//!
//! A listener on an ephemeral port plays the LISY network server with raw
//! reads and writes.

use lisy_core::SwitchNumber;
use lisy_network::{Connection, ConnectionError, TransportConfig};
use lisy_protocol::{Command, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn listen() -> (TcpListener, TransportConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, TransportConfig::network("127.0.0.1", port))
}

/// Test open-request-close against a board that answers reset and identify
#[tokio::test]
async fn test_full_lifecycle_over_tcp() {
    let (listener, config) = listen().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut code = [0u8; 1];

        stream.read_exact(&mut code).await.unwrap();
        assert_eq!(code, [100]);
        stream.write_all(&[0]).await.unwrap();

        stream.read_exact(&mut code).await.unwrap();
        assert_eq!(code, [0]);
        stream.write_all(b"LISY1\0").await.unwrap();

        // Wait for the client to hang up
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });

    let connection = Connection::open(&config).await.unwrap();
    assert!(connection.is_open().await);
    assert_eq!(connection.peer(), config.to_string());

    let reset = connection.request(Command::Reset).await.unwrap();
    assert_eq!(reset, Response::Byte(0));

    let id = connection.request(Command::GetConnectedHardware).await.unwrap();
    assert_eq!(id, Response::String(b"LISY1".to_vec()));

    connection.close().await.unwrap();
    assert!(!connection.is_open().await);
}

/// Concurrent requests from two tasks must never interleave their bytes.
#[tokio::test]
async fn test_concurrent_requests_are_serialized() {
    let (listener, config) = listen().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2];
        loop {
            // Every request here is a two-byte switch status query;
            // reply with the switch number's parity.
            if stream.read_exact(&mut buf).await.is_err() {
                break;
            }
            assert_eq!(buf[0], 40);
            tokio::time::sleep(Duration::from_millis(1)).await;
            stream.write_all(&[buf[1] % 2]).await.unwrap();
        }
    });

    let connection = Arc::new(Connection::open(&config).await.unwrap());

    let mut tasks = Vec::new();
    for worker in 0..2u8 {
        let connection = Arc::clone(&connection);
        tasks.push(tokio::spawn(async move {
            for i in 0..20u8 {
                let number = SwitchNumber::from_row_col(worker * 4 + i / 8, i % 8).unwrap();
                let state = connection
                    .request(Command::GetSwitchStatus(number))
                    .await
                    .unwrap()
                    .into_bool()
                    .unwrap();
                assert_eq!(state, number.as_u8() % 2 == 1);
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

/// Test that a server closing the socket surfaces as a lost connection
#[tokio::test]
async fn test_server_closes_connection() {
    let (listener, config) = listen().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut code = [0u8; 1];
        stream.read_exact(&mut code).await.unwrap();
        // hang up without replying
    });

    let connection = Connection::open(&config).await.unwrap();
    let result = connection.request(Command::GetChangedSwitches).await;

    assert!(matches!(
        result,
        Err(ConnectionError::ConnectionLost(_)) | Err(ConnectionError::Io(_))
    ));
    assert!(result.unwrap_err().is_transport());
    assert!(!connection.is_open().await);
}

/// Test connecting to a port nobody listens on
#[tokio::test]
async fn test_connection_refused() {
    let (listener, config) = listen().await;
    drop(listener);

    let result = Connection::open(&config).await;
    assert!(matches!(result, Err(ConnectionError::Io(_))));
}
