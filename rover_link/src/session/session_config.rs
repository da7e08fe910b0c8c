use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the rover controller.
///
/// ```rust,ignore
/// let config = SessionConfig::new("rover.example.com".to_string(), 8000, 3000);
/// if let Err(e) = config.validate() {
///     println!("configuration error: {}", e);
///     return;
/// }
/// let session = RoverSession::new(config);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub addr: String,
    pub port: u32,
    /// Fixed delay between reconnect attempts, in milliseconds. No backoff,
    /// no jitter, no attempt cap: a human-supervised control session favors
    /// availability over attempt-limiting.
    pub retry_delay_ms: u64,
}

impl SessionConfig {
    pub fn new(addr: String, port: u32, retry_delay_ms: u64) -> Self {
        Self {
            addr,
            port,
            retry_delay_ms,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.addr.is_empty() {
            return Err("Address cannot be empty.".to_string());
        }
        if self.port == 0 {
            return Err("Port number must be greater than 0.".to_string());
        }
        if self.retry_delay_ms == 0 {
            return Err("Retry delay must be greater than 0.".to_string());
        }
        Ok(())
    }

    /// WebSocket endpoint of the controller's web channel.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/ws/web", self.addr, self.port)
    }

    /// Read-only dashboard endpoint (command history and demo catalog).
    pub fn dashboard_url(&self) -> String {
        format!("http://{}:{}/api/dashboard", self.addr, self.port)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 8000,
            retry_delay_ms: 3000,
        }
    }
}
