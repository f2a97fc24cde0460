//! Viewer-side client: consume the live broadcast envelope stream for one
//! match.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::BroadcastEnvelope;

/// A live websocket subscription to one match topic.
///
/// After the handshake the server pushes [`BroadcastEnvelope`] frames; the
/// client never sends application frames (ping/pong keepalive is handled
/// internally).
pub struct LiveClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveClient {
    /// Connect to `{base_ws_url}/matches/{match_id}/live`.
    ///
    /// `base_ws_url` uses the `ws`/`wss` scheme, e.g.
    /// `wss://relay.example.com`.
    pub async fn connect(base_ws_url: &str, match_id: i64) -> Result<Self, ClientError> {
        let url = Url::parse(base_ws_url)?.join(&format!("/matches/{match_id}/live"))?;
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(Self { stream })
    }

    /// Wait for the next envelope.
    ///
    /// Returns `None` once the server closes the stream. Control frames are
    /// answered transparently and unparsable frames are surfaced as JSON
    /// errors rather than skipped.
    pub async fn next_envelope(&mut self) -> Result<Option<BroadcastEnvelope>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => {
                    return Ok(Some(serde_json::from_str(text.as_str())?));
                }
                Message::Ping(payload) => {
                    self.stream.send(Message::Pong(payload)).await?;
                }
                Message::Close(_) => return Ok(None),
                Message::Binary(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    /// Close the subscription.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
