// Runtime configuration shared by every layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    /// Messages retained per room before the oldest are evicted.
    pub history_limit: usize,
    /// Per-room broadcast buffer; a feed that falls further behind is cut off.
    pub feed_capacity: usize,
    /// Upper bound on message length, counted in characters.
    pub max_message_len: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 15,
            history_limit: 10_000,
            feed_capacity: 256,
            max_message_len: 4096,
            allowed_origins: Vec::new(),
        }
    }
}
