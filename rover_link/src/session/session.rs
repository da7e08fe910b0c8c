use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::errors::LinkError;
use crate::packets::{InboundFrame, InboundMessage, Recording, Request, SpeedMode};
use crate::Command;

use super::SessionConfig;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Lifecycle and traffic notifications for subscribers. `Connected` and
/// `Disconnected` carry no payload; classified controller messages arrive as
/// `Message` values, one per matched shape.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Message(InboundMessage),
}

/// Maintains exactly one logical connection to the rover controller,
/// transparently replacing a dropped transport, and routes inbound frames to
/// subscribers as typed events.
///
/// The write half of the socket is the only shared mutable resource; all
/// mutation of the transport is funneled through this type.
#[derive(Debug, Clone)]
pub struct RoverSession {
    pub config: SessionConfig,
    event_tx: broadcast::Sender<SessionEvent>,
    sink: Arc<Mutex<Option<WsSink>>>,
    supervising: Arc<AtomicBool>,
}

impl RoverSession {
    pub fn new(config: SessionConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(100);
        Self {
            config,
            event_tx,
            sink: Arc::new(Mutex::new(None)),
            supervising: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the connection supervisor. Idempotent: while an attempt is
    /// pending or a connection is open, further calls are no-ops. The
    /// supervisor never stops; after every drop or failed dial it waits the
    /// configured retry delay and dials again.
    pub fn connect(&self) {
        if self.supervising.swap(true, Ordering::SeqCst) {
            debug!("connect ignored: supervisor already running");
            return;
        }
        let session = self.clone();
        tokio::spawn(async move {
            session.supervise().await;
        });
    }

    async fn supervise(&self) {
        let url = self.config.ws_url();
        loop {
            match connect_async(url.as_str()).await {
                Ok((stream, _response)) => {
                    info!("connected to {}", url);
                    let (write, read) = stream.split();
                    *self.sink.lock().await = Some(write);
                    let _ = self.event_tx.send(SessionEvent::Connected);

                    self.read_frames(read).await;

                    *self.sink.lock().await = None;
                    warn!("connection to {} lost", url);
                    let _ = self.event_tx.send(SessionEvent::Disconnected);
                }
                Err(e) => {
                    warn!("failed to connect to {}: {}", url, e);
                    let _ = self.event_tx.send(SessionEvent::Disconnected);
                }
            }
            sleep(self.config.retry_delay()).await;
        }
    }

    async fn read_frames(&self, mut read: WsSource) {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch(&text),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("transport error: {}", e);
                    break;
                }
            }
        }
    }

    /// Classifies one inbound frame and emits every matched message. Frames
    /// that are not valid JSON are dropped with a notice; frames matching no
    /// known shape are dropped silently so newer controller messages do not
    /// break older clients.
    fn dispatch(&self, raw: &str) {
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        let matched = frame.classify();
        if matched.is_empty() {
            debug!("frame matched no known shape: {}", raw);
            return;
        }
        for message in matched {
            let _ = self.event_tx.send(SessionEvent::Message(message));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub async fn is_connected(&self) -> bool {
        self.sink.lock().await.is_some()
    }

    /// Serializes and transmits a request, only while connected. Requests
    /// issued while disconnected are dropped and reported as `NotConnected`:
    /// a stale queued command replaying after reconnect would move the rover
    /// when the operator no longer expects it.
    pub async fn send(&self, request: &Request) -> Result<(), LinkError> {
        let serialized =
            serde_json::to_string(request).map_err(|e| LinkError::Serialization(e.to_string()))?;

        let mut guard = self.sink.lock().await;
        let sink = match guard.as_mut() {
            Some(sink) => sink,
            None => {
                warn!("dropped request, not connected: {}", serialized);
                return Err(LinkError::NotConnected);
            }
        };

        if let Err(e) = sink.send(Message::Text(serialized)).await {
            warn!("failed to send request: {}", e);
            return Err(LinkError::FailedToSend(e.to_string()));
        }
        Ok(())
    }

    pub async fn send_move(&self, command: Command) -> Result<(), LinkError> {
        self.send(&Request::Move { command }).await
    }

    pub async fn set_speed(&self, mode: SpeedMode) -> Result<(), LinkError> {
        self.send(&Request::Speed { mode }).await
    }

    /// Persists a recording under `name` on the controller. Blank names are
    /// rejected locally, before any network traffic.
    pub async fn save_demo(&self, name: &str, steps: Recording) -> Result<(), LinkError> {
        if name.trim().is_empty() {
            return Err(LinkError::EmptyDemoName);
        }
        self.send(&Request::SaveDemo {
            name: name.to_string(),
            steps,
        })
        .await
    }

    pub async fn run_demo(&self, name: &str) -> Result<(), LinkError> {
        if name.trim().is_empty() {
            return Err(LinkError::EmptyDemoName);
        }
        self.send(&Request::RunDemo {
            name: name.to_string(),
        })
        .await
    }
}
