//! Desktop WebSocket transport using tokio-tungstenite
//!
//! Each socket attempt runs on its own task that owns the split stream. The
//! adapter itself only keeps a channel to the live attempt, so every
//! `TransportPort` call returns immediately.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::ports::outbound::{AttemptId, TransportError, TransportEvent, TransportPort};

enum Outgoing {
    Text(String),
    Close,
}

struct LiveSocket {
    attempt: AttemptId,
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

/// WebSocket transport for the game server (Desktop)
pub struct DesktopTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    live: Option<LiveSocket>,
}

impl DesktopTransport {
    /// Socket outcomes are reported on `events`.
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { events, live: None }
    }
}

impl TransportPort for DesktopTransport {
    fn open(&mut self, url: &Url, attempt: AttemptId) -> Result<(), TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Open(e.to_string()))?;

        if let Some(previous) = self.live.take() {
            let _ = previous.outgoing.send(Outgoing::Close);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_socket(url.clone(), attempt, rx, self.events.clone()));
        self.live = Some(LiveSocket {
            attempt,
            outgoing: tx,
        });
        Ok(())
    }

    fn send(&mut self, attempt: AttemptId, text: &str) -> Result<(), TransportError> {
        match &self.live {
            Some(live) if live.attempt == attempt => live
                .outgoing
                .send(Outgoing::Text(text.to_string()))
                .map_err(|_| TransportError::Send("socket task has ended".to_string())),
            _ => Err(TransportError::NotOpen(attempt)),
        }
    }

    fn close(&mut self, attempt: AttemptId) {
        if self.live.as_ref().is_some_and(|live| live.attempt == attempt) {
            if let Some(live) = self.live.take() {
                let _ = live.outgoing.send(Outgoing::Close);
            }
        }
    }
}

async fn run_socket(
    url: Url,
    attempt: AttemptId,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            tracing::warn!(%attempt, error = %e, "failed to connect to game server");
            let _ = events.send(TransportEvent::closed(attempt, e.to_string()));
            return;
        }
    };
    tracing::info!(%attempt, host = url.host_str().unwrap_or_default(), "connected to game server");
    let _ = events.send(TransportEvent::opened(attempt));

    let (mut write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            msg = outgoing.recv() => match msg {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        break format!("write failed: {e}");
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = write.close().await;
                    break "closed by client".to_string();
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::text(attempt, text));
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "server closed connection".to_string());
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_string(),
            },
        }
    };

    tracing::info!(%attempt, reason = %reason, "game socket task finished");
    let _ = events.send(TransportEvent::closed(attempt, reason));
}
