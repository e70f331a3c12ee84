//! Effective node settings: the config DTO with defaults applied and
//! values validated.

mod defaults;
mod reconnect;

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::AppConfig;

pub use defaults::*;
pub use reconnect::ReconnectPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("service type `{0}` must end with `._tcp.local.` or `._udp.local.`")]
    InvalidServiceType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    /// Explicit node id; `None` derives it from the hostname.
    pub node_name: Option<String>,
    pub broadcast_port: u16,
    pub bind_address: IpAddr,
    pub service_type: String,
    pub max_frame_bytes: usize,
    pub history_capacity: usize,
    pub poll_interval: Duration,
    pub write_received_to_clipboard: bool,
    pub reconnect: ReconnectPolicy,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            node_name: None,
            broadcast_port: DEFAULT_BROADCAST_PORT,
            bind_address: DEFAULT_BIND_ADDRESS,
            service_type: crate::network::DEFAULT_SERVICE_TYPE.to_string(),
            max_frame_bytes: crate::protocol::DEFAULT_MAX_FRAME_BYTES,
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_received_to_clipboard: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl NodeSettings {
    /// Apply defaults to every empty or zero value of the DTO.
    pub fn from_config(config: &AppConfig) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let bind_address = match config.bind_address.trim() {
            "" => defaults.bind_address,
            raw => raw
                .parse()
                .map_err(|_| SettingsError::InvalidBindAddress(raw.to_string()))?,
        };

        let service_type = match config.service_type.trim() {
            "" => defaults.service_type,
            raw if raw.ends_with("._tcp.local.") || raw.ends_with("._udp.local.") => {
                raw.to_string()
            }
            raw => return Err(SettingsError::InvalidServiceType(raw.to_string())),
        };

        let reconnect = ReconnectPolicy {
            initial_delay: non_zero_ms(config.reconnect_initial_ms)
                .unwrap_or(defaults.reconnect.initial_delay),
            max_delay: non_zero_ms(config.reconnect_max_ms)
                .unwrap_or(defaults.reconnect.max_delay),
            max_attempts: match config.reconnect_max_attempts {
                0 => None,
                n => Some(n.min(u32::MAX as u64) as u32),
            },
        }
        .normalized();

        Ok(Self {
            node_name: Some(config.node_name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            broadcast_port: match config.broadcast_port {
                0 => defaults.broadcast_port,
                port => port,
            },
            bind_address,
            service_type,
            max_frame_bytes: match config.max_frame_bytes {
                0 => defaults.max_frame_bytes,
                n => n as usize,
            },
            history_capacity: match config.history_capacity {
                0 => defaults.history_capacity,
                n => n as usize,
            },
            poll_interval: non_zero_ms(config.poll_interval_ms).unwrap_or(defaults.poll_interval),
            write_received_to_clipboard: config
                .write_received_to_clipboard
                .unwrap_or(defaults.write_received_to_clipboard),
            reconnect,
        })
    }
}

fn non_zero_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
