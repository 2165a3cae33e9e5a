//! Raw frame reader for the Arbitrum sequencer feed.
//!
//! Unlike every other upstream this crate talks to, the sequencer feed is
//! not JSON-RPC: there's no subscribe handshake and no envelope, just a
//! stream of JSON frames pushed as they're produced. [`jsonrpsee`]'s client
//! assumes a request/response or subscription protocol, so it doesn't fit
//! here; we connect with a plain websocket client instead.

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use crate::Error;

/// A connection to the sequencer feed, yielding one decoded JSON frame per message.
pub struct SequencerFeed {
    stream: tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
}

impl SequencerFeed {
    /// Open a websocket connection to `url` and prepare to read frames from it.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|err| Error::Client(Box::new(err)))?;
        Ok(Self { stream })
    }

    /// Wait for and decode the next frame. Returns `Ok(None)` when the
    /// feed closes cleanly; text frames that aren't valid JSON are
    /// reported as a deserialization error rather than silently skipped,
    /// since a malformed frame from the sequencer feed itself (as opposed
    /// to a malformed transaction within one) indicates something is
    /// wrong with the connection.
    pub async fn next_frame(&mut self) -> Option<Result<serde_json::Value, Error>> {
        loop {
            let message = self.stream.next().await?;
            let message = match message {
                Ok(message) => message,
                Err(err) => return Some(Err(Error::Client(Box::new(err)))),
            };

            match message {
                Message::Text(text) => {
                    return Some(serde_json::from_str(&text).map_err(Error::Deserialization));
                }
                Message::Binary(bytes) => {
                    return Some(serde_json::from_slice(&bytes).map_err(Error::Deserialization));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
                Message::Close(_) => return None,
            }
        }
    }
}
