/// An inbound "message created" gateway event.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
}

impl MessageEvent {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            text: text.into(),
        }
    }
}

/// Initial state sync delivered when the gateway session becomes ready.
#[derive(Debug, Clone)]
pub struct ReadyInfo {
    pub session_id: String,
    pub bot_user_id: String,
}
