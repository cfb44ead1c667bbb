//! Reply capability handed to the bot controller

use tokio::sync::{mpsc, watch};

use crate::application::errors::SendError;
use crate::domain::traits::ReplySink;

use super::session::SessionState;

/// Hard cap on outbound reply length, the platform's message limit.
pub const MAX_REPLY_CHARS: usize = 2000;

const TRUNCATION_MARKER: char = '…';

/// An outbound reply queued for the gateway writer.
#[derive(Debug, Clone)]
pub struct OutboundReply {
    pub channel_id: String,
    pub content: String,
}

/// Cheap clonable capability to send replies while the session is ready.
/// The socket itself never leaves the session manager.
#[derive(Clone)]
pub struct ReplyHandle {
    tx: mpsc::UnboundedSender<OutboundReply>,
    state: watch::Receiver<SessionState>,
}

impl ReplyHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<OutboundReply>,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self { tx, state }
    }

    pub fn session_state(&self) -> SessionState {
        *self.state.borrow()
    }
}

impl ReplySink for ReplyHandle {
    fn send_reply(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        if self.session_state() != SessionState::Ready {
            return Err(SendError::NotReady);
        }
        let content = truncate_reply(text);
        self.tx
            .send(OutboundReply {
                channel_id: channel_id.to_string(),
                content,
            })
            .map_err(|_| SendError::Rejected("gateway writer closed".to_string()))
    }
}

/// Replies over the cap are truncated on a char boundary, never rejected.
fn truncate_reply(text: &str) -> String {
    if text.chars().count() <= MAX_REPLY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_REPLY_CHARS - 1).collect();
    out.push(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_replies_pass_through_unchanged() {
        assert_eq!(truncate_reply("hello"), "hello");
        let exactly_cap = "x".repeat(MAX_REPLY_CHARS);
        assert_eq!(truncate_reply(&exactly_cap), exactly_cap);
    }

    #[test]
    fn long_replies_are_truncated_with_a_marker() {
        let long = "y".repeat(MAX_REPLY_CHARS + 100);
        let out = truncate_reply(&long);
        assert_eq!(out.chars().count(), MAX_REPLY_CHARS);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_REPLY_CHARS + 1);
        let out = truncate_reply(&long);
        assert_eq!(out.chars().count(), MAX_REPLY_CHARS);
    }

    #[test]
    fn send_fails_while_not_ready() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(SessionState::Reconnecting);
        let handle = ReplyHandle::new(tx, state_rx);

        assert!(matches!(
            handle.send_reply("C1", "hi"),
            Err(SendError::NotReady)
        ));
    }

    #[test]
    fn send_enqueues_while_ready() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(SessionState::Ready);
        let handle = ReplyHandle::new(tx, state_rx);

        handle.send_reply("C1", "floor is 80.5 ETH").unwrap();
        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.channel_id, "C1");
        assert_eq!(queued.content, "floor is 80.5 ETH");
    }
}
