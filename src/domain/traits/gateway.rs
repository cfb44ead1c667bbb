use async_trait::async_trait;

use crate::application::errors::SendError;
use crate::domain::entities::{MessageEvent, ReadyInfo};

/// Receiver of gateway events. Registered once with the session manager;
/// the registration survives reconnects.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called when the session finishes its initial state sync.
    async fn on_ready(&self, _info: ReadyInfo) {}

    /// Called for every inbound "message created" event while the session
    /// is ready. Each invocation runs in its own task.
    async fn on_message(&self, event: MessageEvent);
}

/// Capability to send a reply into a channel.
///
/// The only way any component other than the session manager touches the
/// gateway connection.
pub trait ReplySink: Send + Sync {
    fn send_reply(&self, channel_id: &str, text: &str) -> Result<(), SendError>;
}
