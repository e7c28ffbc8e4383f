//! Reference `TransportAdapter` binding over a plain WebSocket connection
//! (`tokio-tungstenite`). Messages are framed one-per-text-frame, JSON-encoded.

use std::sync::Arc;

use async_trait::async_trait;
use edgehub_core::{Message, TransportAdapter, TransportError, TransportFactory};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Recognizes the `"websocket"` transport type (case-insensitive); any other value is a
/// fatal configuration error the caller surfaces as `FatalError::NoTransportAdapter`.
pub struct WebSocketTransportFactory;

impl WebSocketTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl TransportFactory for WebSocketTransportFactory {
    fn create(&self, transport_type: &str, url: Url) -> Option<Arc<dyn TransportAdapter>> {
        if !transport_type.eq_ignore_ascii_case("websocket") {
            return None;
        }
        Some(Arc::new(WebSocketTransport::new(url)))
    }
}

#[derive(Clone)]
struct Connected {
    writer: Arc<tokio::sync::Mutex<SplitSink<WsStream, WsMessage>>>,
    reader: Arc<tokio::sync::Mutex<SplitStream<WsStream>>>,
}

/// A `TransportAdapter` bound to one WebSocket URL.
///
/// `send` is safe under concurrent invocation (§5): the writer half lives behind its
/// own `tokio::sync::Mutex`, independent of the reader half's, so the outbound and
/// heartbeat pumps serialize with each other on writes without ever blocking on the
/// inbound pump's long-lived `receive` call. `connected` itself is a `parking_lot`
/// lock held only long enough to clone out the `Arc` handles below — never across an
/// `.await` — so it cannot itself become a point of contention between readers and
/// writers.
pub struct WebSocketTransport {
    url: Url,
    connected: parking_lot::RwLock<Option<Connected>>,
}

impl WebSocketTransport {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connected: parking_lot::RwLock::new(None),
        }
    }
}

#[async_trait]
impl TransportAdapter for WebSocketTransport {
    async fn init(&self) -> Result<(), TransportError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Io(anyhow::anyhow!(e)))?;
        let (writer, reader) = stream.split();

        *self.connected.write() = Some(Connected {
            writer: Arc::new(tokio::sync::Mutex::new(writer)),
            reader: Arc::new(tokio::sync::Mutex::new(reader)),
        });
        Ok(())
    }

    async fn uninit(&self) {
        let Some(connected) = self.connected.write().take() else {
            return;
        };
        let _ = connected
            .writer
            .lock()
            .await
            .send(WsMessage::Close(None))
            .await;
    }

    async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        let writer = {
            let guard = self.connected.read();
            guard.as_ref().ok_or(TransportError::NotConnected)?.writer.clone()
        };

        let text =
            serde_json::to_string(msg).map_err(|e| TransportError::Io(anyhow::anyhow!(e)))?;

        writer
            .lock()
            .await
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| TransportError::Io(anyhow::anyhow!(e)))
    }

    async fn receive(&self) -> Result<Message, TransportError> {
        let reader = {
            let guard = self.connected.read();
            guard.as_ref().ok_or(TransportError::NotConnected)?.reader.clone()
        };
        let mut reader = reader.lock().await;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| TransportError::Io(anyhow::anyhow!(e)));
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    return serde_json::from_slice(&bytes)
                        .map_err(|e| TransportError::Io(anyhow::anyhow!(e)));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    return Err(TransportError::Io(anyhow::anyhow!(
                        "peer closed the connection: {frame:?}"
                    )));
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    continue;
                }
                Some(Err(e)) => return Err(TransportError::Io(anyhow::anyhow!(e))),
                None => {
                    return Err(TransportError::Io(anyhow::anyhow!(
                        "websocket stream ended"
                    )));
                }
            }
        }
    }
}
