use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use rover_link::packets::{InboundMessage, TelemetryBand};
use rover_link::session::{RoverSession, SessionConfig, SessionEvent};
use rover_link::{Command, LinkError};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const RETRY_MS: u64 = 200;

async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

async fn bind_local() -> (TcpListener, SessionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port() as u32;
    let config = SessionConfig::new("127.0.0.1".to_string(), port, RETRY_MS);
    (listener, config)
}

#[tokio::test]
async fn test_send_while_disconnected_is_dropped() {
    // No controller listening at all; the session was never connected.
    let session = RoverSession::new(SessionConfig::new("127.0.0.1".to_string(), 9, RETRY_MS));
    let err = session
        .send_move(Command::new("ADELANTE"))
        .await
        .unwrap_err();
    assert_eq!(err, LinkError::NotConnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reconnects_after_transport_drop() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        // First connection: handshake, then drop the socket outright.
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        drop(ws);

        // Second connection: stay up and push a telemetry frame.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(
            r#"{"tipo":"sensor","valor":"15.0"}"#.to_string(),
        ))
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let session = RoverSession::new(config);
    let mut events = session.subscribe();
    session.connect();

    assert!(matches!(next_event(&mut events).await, SessionEvent::Connected));

    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Disconnected
    ));
    let dropped_at = Instant::now();

    // Recovery requires no external call, but must wait out the fixed delay:
    // never more than one dial per retry window.
    assert!(matches!(next_event(&mut events).await, SessionEvent::Connected));
    assert!(
        dropped_at.elapsed() >= Duration::from_millis(RETRY_MS - 50),
        "reconnected faster than the retry delay allows"
    );
    assert!(session.is_connected().await);

    // The replacement connection dispatches frames like the first one.
    match next_event(&mut events).await {
        SessionEvent::Message(InboundMessage::Telemetry { value, band }) => {
            assert_eq!(value, 15.0);
            assert_eq!(band, TelemetryBand::Critical);
        }
        other => panic!("expected a telemetry event, got {:?}", other),
    }

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_is_idempotent() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"status":"demo_finalizada"}"#.to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let session = RoverSession::new(config);
    let mut events = session.subscribe();
    session.connect();
    assert!(matches!(next_event(&mut events).await, SessionEvent::Connected));

    // A second connect() while the link is up must not spawn a second
    // supervisor: the next event is the controller's frame, not another
    // Connected.
    session.connect();
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Message(InboundMessage::DemoFinished)
    ));

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_reach_the_wire() {
    let (listener, config) = bind_local().await;
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            if let Message::Text(text) = frame {
                let _ = reply_tx.send(text);
                break;
            }
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let session = RoverSession::new(config);
    let mut events = session.subscribe();
    session.connect();
    assert!(matches!(next_event(&mut events).await, SessionEvent::Connected));

    session.send_move(Command::new("ADELANTE")).await.unwrap();

    let raw = timeout(Duration::from_secs(5), reply_rx)
        .await
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["accion"], "mover");
    assert_eq!(value["comando"], "ADELANTE");

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blank_demo_name_rejected_before_any_traffic() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Fail the test from the server side if anything arrives.
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            panic!("unexpected traffic for a blank demo name: {}", text);
        }
    });

    let session = RoverSession::new(config);
    let mut events = session.subscribe();
    session.connect();
    assert!(matches!(next_event(&mut events).await, SessionEvent::Connected));

    assert_eq!(
        session.save_demo("   ", Vec::new()).await,
        Err(LinkError::EmptyDemoName)
    );
    assert_eq!(session.run_demo("").await, Err(LinkError::EmptyDemoName));

    server.abort();
}
