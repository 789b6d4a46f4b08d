//! In-memory transport that records every call.

use url::Url;

use crate::ports::outbound::{AttemptId, TransportError, TransportPort};

#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub opened: Vec<(Url, AttemptId)>,
    pub sent: Vec<(AttemptId, String)>,
    pub closed: Vec<AttemptId>,
    /// When set, every `send` fails as if the socket had dropped.
    pub fail_sends: bool,
}

impl RecordingTransport {
    /// Sent frames decoded back to JSON, in send order.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|(_, text)| serde_json::from_str(text).ok())
            .collect()
    }
}

impl TransportPort for RecordingTransport {
    fn open(&mut self, url: &Url, attempt: AttemptId) -> Result<(), TransportError> {
        self.opened.push((url.clone(), attempt));
        Ok(())
    }

    fn send(&mut self, attempt: AttemptId, text: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("socket dropped".to_string()));
        }
        self.sent.push((attempt, text.to_string()));
        Ok(())
    }

    fn close(&mut self, attempt: AttemptId) {
        self.closed.push(attempt);
    }
}
