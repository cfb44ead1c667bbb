//! Gateway session state machine

use std::time::Duration;

/// Lifecycle of the persistent gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticated,
    Ready,
    Reconnecting,
}

/// Pure connection-lifecycle state, including heartbeat accounting and
/// sequence tracking. Owns no I/O; the manager drives it from socket events.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    last_seq: Option<u64>,
    heartbeat_interval: Option<Duration>,
    unacked_heartbeats: u8,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            last_seq: None,
            heartbeat_interval: None,
            unacked_heartbeats: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// A new connection attempt starts; per-connection state resets.
    pub fn begin_connect(&mut self) {
        self.state = SessionState::Connecting;
        self.last_seq = None;
        self.heartbeat_interval = None;
        self.unacked_heartbeats = 0;
    }

    /// HELLO received and IDENTIFY sent.
    pub fn authenticated(&mut self, heartbeat_interval: Duration) {
        self.state = SessionState::Authenticated;
        self.heartbeat_interval = Some(heartbeat_interval);
    }

    /// READY dispatch: initial state sync complete.
    pub fn ready(&mut self) {
        self.state = SessionState::Ready;
    }

    pub fn record_seq(&mut self, seq: u64) {
        self.last_seq = Some(seq);
    }

    /// Account for a heartbeat about to go out. Returns `false` when two
    /// heartbeats are already outstanding: the connection is considered dead
    /// and must be torn down.
    pub fn record_heartbeat_sent(&mut self) -> bool {
        if self.unacked_heartbeats >= 2 {
            return false;
        }
        self.unacked_heartbeats += 1;
        true
    }

    pub fn record_heartbeat_ack(&mut self) {
        self.unacked_heartbeats = 0;
    }

    /// Transport failure from any state.
    pub fn reconnecting(&mut self) {
        self.state = SessionState::Reconnecting;
    }

    /// Intentional shutdown.
    pub fn disconnected(&mut self) {
        self.state = SessionState::Disconnected;
    }
}
