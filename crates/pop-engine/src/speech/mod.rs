//! Tick-driven channel to the host's text-to-speech collaborator.
//!
//! The game asks for a phrase with [`SpeechChannel::request`]; the host
//! drains pending requests (as JSON), synthesizes them and answers with a
//! [`SpeechReply`] carrying base64 PCM, or a failure. Replies are picked up
//! by the game on a later tick.

use serde::Serialize;

/// Correlates a request with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpeechId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechRequest {
    pub id: SpeechId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechReply {
    /// Base64 16-bit PCM in the configured audio format.
    Audio { id: SpeechId, pcm_base64: String },
    /// Synthesis failed or produced nothing. Treated as absent audio.
    Failed { id: SpeechId },
}

impl SpeechReply {
    pub fn id(&self) -> SpeechId {
        match self {
            SpeechReply::Audio { id, .. } | SpeechReply::Failed { id } => *id,
        }
    }
}

#[derive(Debug, Default)]
pub struct SpeechChannel {
    next_id: u32,
    outgoing: Vec<SpeechRequest>,
    incoming: Vec<SpeechReply>,
}

impl SpeechChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue text for synthesis. Empty text is still requested; the host decides.
    pub fn request(&mut self, text: impl Into<String>) -> SpeechId {
        self.next_id += 1;
        let id = SpeechId(self.next_id);
        let text = text.into();
        log::debug!("speech request {:?}: {:?}", id, text);
        self.outgoing.push(SpeechRequest { id, text });
        id
    }

    /// Requests not yet handed to the host, oldest first.
    pub fn drain_requests(&mut self) -> Vec<SpeechRequest> {
        std::mem::take(&mut self.outgoing)
    }

    /// Drain pending requests as a JSON array of `{id, text}`.
    pub fn requests_json(&mut self) -> String {
        let requests = self.drain_requests();
        serde_json::to_string(&requests).unwrap_or_else(|err| {
            log::error!("failed to serialize speech requests: {}", err);
            "[]".to_string()
        })
    }

    pub fn pending_requests(&self) -> usize {
        self.outgoing.len()
    }

    /// Hand a reply from the host to the game.
    pub fn deliver(&mut self, reply: SpeechReply) {
        self.incoming.push(reply);
    }

    pub fn drain_replies(&mut self) -> Vec<SpeechReply> {
        std::mem::take(&mut self.incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        let mut ch = SpeechChannel::new();
        let a = ch.request("Find the letter A");
        let b = ch.request("Great job");
        assert_ne!(a, b);
        assert_eq!(ch.pending_requests(), 2);
    }

    #[test]
    fn requests_serialize_in_order_and_drain() {
        let mut ch = SpeechChannel::new();
        ch.request("one");
        ch.request("two");
        let json = ch.requests_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["id"], 1);
        assert_eq!(parsed[0]["text"], "one");
        assert_eq!(parsed[1]["text"], "two");
        assert_eq!(ch.requests_json(), "[]");
    }

    #[test]
    fn replies_round_trip_through_channel() {
        let mut ch = SpeechChannel::new();
        let id = ch.request("hi");
        ch.deliver(SpeechReply::Failed { id });
        let replies = ch.drain_replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id(), id);
        assert!(ch.drain_replies().is_empty());
    }
}
