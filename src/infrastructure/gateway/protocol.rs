//! Gateway wire protocol - JSON frames over the WebSocket

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::application::errors::GatewayError;

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_IDENTIFY: u8 = 2;
pub const OP_MESSAGE_SEND: u8 = 3;
pub const OP_HELLO: u8 = 10;
pub const OP_HEARTBEAT_ACK: u8 = 11;

pub const DISPATCH_READY: &str = "READY";
pub const DISPATCH_MESSAGE_CREATE: &str = "MESSAGE_CREATE";

/// A single gateway frame. `d` carries the op-specific payload; `s` is the
/// server sequence number on dispatches; `t` names the dispatch event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub op: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

/// HELLO payload announcing the heartbeat cadence, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// READY payload: initial state sync.
#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub session_id: String,
    pub user: UserRef,
}

/// MESSAGE_CREATE payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub id: String,
    pub channel_id: String,
    pub author: UserRef,
    pub content: String,
}

impl Frame {
    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(text).map_err(|e| GatewayError::Protocol(e.to_string()))
    }

    pub fn identify(token: &str) -> Self {
        Self {
            op: OP_IDENTIFY,
            d: Some(json!({ "token": token })),
            s: None,
            t: None,
        }
    }

    pub fn heartbeat(last_seq: Option<u64>) -> Self {
        Self {
            op: OP_HEARTBEAT,
            d: Some(json!(last_seq)),
            s: None,
            t: None,
        }
    }

    pub fn message_send(channel_id: &str, content: &str) -> Self {
        Self {
            op: OP_MESSAGE_SEND,
            d: Some(json!({ "channel_id": channel_id, "content": content })),
            s: None,
            t: None,
        }
    }

    /// Deserialize the payload into an op-specific type.
    pub fn data<T: serde::de::DeserializeOwned>(&self) -> Result<T, GatewayError> {
        let d = self
            .d
            .clone()
            .ok_or_else(|| GatewayError::Protocol("frame missing payload".to_string()))?;
        serde_json::from_value(d).map_err(|e| GatewayError::Protocol(e.to_string()))
    }

    pub fn event_type(&self) -> Option<&str> {
        self.t.as_deref()
    }

    pub fn to_text(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Protocol(e.to_string()))
    }
}
