//! # Pure Data Module / 纯数据模块
//!
//! Configuration DTO mapped straight from the TOML file.
//!
//! - No validation: an out-of-range port is a fact, not an error here.
//! - No defaults: a missing key becomes an empty/zero value.
//!
//! Defaults and validation live in [`crate::settings`].

/// Application configuration DTO (pure data, no logic)
/// 应用配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Overrides the hostname-derived node id. Empty means "use hostname".
    pub node_name: String,

    /// TCP port for the publisher bind and every subscriber dial.
    pub broadcast_port: u16,

    /// Local interface the publisher binds to (unparsed).
    pub bind_address: String,

    /// DNS-SD service type shared by all nodes.
    pub service_type: String,

    pub max_frame_bytes: u64,

    pub history_capacity: u64,

    pub poll_interval_ms: u64,

    /// `None` when the key is absent.
    pub write_received_to_clipboard: Option<bool>,

    pub reconnect_initial_ms: u64,

    pub reconnect_max_ms: u64,

    pub reconnect_max_attempts: u64,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    /// 从 TOML 值创建 AppConfig
    ///
    /// Must NOT contain validation or default value logic.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let section = |name: &str, key: &str| toml_value.get(name).and_then(|s| s.get(key));
        let string = |name: &str, key: &str| {
            section(name, key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let integer = |name: &str, key: &str| {
            section(name, key)
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
                .max(0) as u64
        };

        Ok(Self {
            node_name: string("node", "name"),
            broadcast_port: integer("network", "broadcast_port") as u16,
            bind_address: string("network", "bind_address"),
            service_type: string("network", "service_type"),
            max_frame_bytes: integer("network", "max_frame_bytes"),
            history_capacity: integer("history", "capacity"),
            poll_interval_ms: integer("sync", "poll_interval_ms"),
            write_received_to_clipboard: section("sync", "write_received_to_clipboard")
                .and_then(|v| v.as_bool()),
            reconnect_initial_ms: integer("sync", "reconnect_initial_ms"),
            reconnect_max_ms: integer("sync", "reconnect_max_ms"),
            reconnect_max_attempts: integer("sync", "reconnect_max_attempts"),
        })
    }

    /// Create empty AppConfig (all empty/default values)
    /// 创建空的 AppConfig（所有字段为空/默认值）
    pub fn empty() -> Self {
        Self {
            node_name: String::new(),
            broadcast_port: 0,
            bind_address: String::new(),
            service_type: String::new(),
            max_frame_bytes: 0,
            history_capacity: 0,
            poll_interval_ms: 0,
            write_received_to_clipboard: None,
            reconnect_initial_ms: 0,
            reconnect_max_ms: 0,
            reconnect_max_attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_reads_all_sections() {
        let value: toml::Value = toml::from_str(
            r#"
            [node]
            name = "desk"

            [network]
            broadcast_port = 5556
            bind_address = "192.168.1.4"
            service_type = "_clip._tcp.local."
            max_frame_bytes = 4096

            [history]
            capacity = 50

            [sync]
            poll_interval_ms = 250
            write_received_to_clipboard = false
            reconnect_initial_ms = 100
            reconnect_max_ms = 2000
            reconnect_max_attempts = 7
            "#,
        )
        .unwrap();

        let config = AppConfig::from_toml(&value).unwrap();

        assert_eq!(config.node_name, "desk");
        assert_eq!(config.broadcast_port, 5556);
        assert_eq!(config.bind_address, "192.168.1.4");
        assert_eq!(config.service_type, "_clip._tcp.local.");
        assert_eq!(config.max_frame_bytes, 4096);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.write_received_to_clipboard, Some(false));
        assert_eq!(config.reconnect_initial_ms, 100);
        assert_eq!(config.reconnect_max_ms, 2000);
        assert_eq!(config.reconnect_max_attempts, 7);
    }

    #[test]
    fn test_missing_keys_are_empty_facts() {
        let value: toml::Value = toml::from_str("[network]\n").unwrap();
        let config = AppConfig::from_toml(&value).unwrap();
        assert_eq!(config, AppConfig::empty());
    }

    #[test]
    fn test_negative_numbers_become_zero() {
        let value: toml::Value = toml::from_str("[history]\ncapacity = -5\n").unwrap();
        let config = AppConfig::from_toml(&value).unwrap();
        assert_eq!(config.history_capacity, 0);
    }
}
