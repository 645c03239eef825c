//! Runtime settings for the hub server.

use crate::hub::EchoPolicy;
use shared::{DEFAULT_HOST, DEFAULT_PORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Address the WebSocket listener binds to
    pub bind_addr: String,
    /// Sessions beyond this count are refused at connect time
    pub max_sessions: usize,
    /// Frames a session may have queued before it is dropped as backlogged
    pub outbound_capacity: usize,
    pub echo: EchoPolicy,
}

impl HubConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            ..Self::default()
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            max_sessions: 1024,
            outbound_capacity: 256,
            echo: EchoPolicy::SkipSource,
        }
    }
}
