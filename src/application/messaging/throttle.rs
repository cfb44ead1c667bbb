//! Per-channel command throttle

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window throttle keyed by channel id.
///
/// Caps how many lookups a single channel can trigger inside the window;
/// throttled commands get a short reply instead of a marketplace call.
pub struct ChannelThrottle {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl ChannelThrottle {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record an attempt from `channel_id`. Returns `Err(retry_after)` when
    /// the channel is over its budget.
    pub fn check(&self, channel_id: &str) -> Result<(), Duration> {
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            // A poisoned lock only loses throttle history.
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();
        let times = requests.entry(channel_id.to_string()).or_default();
        times.retain(|&t| now.duration_since(t) < self.window);

        if times.len() >= self.max_requests as usize {
            let retry_after = times
                .first()
                .map(|t| self.window.saturating_sub(now.duration_since(*t)))
                .unwrap_or(self.window);
            return Err(retry_after);
        }

        times.push(now);
        Ok(())
    }
}
