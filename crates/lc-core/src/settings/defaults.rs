use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub const DEFAULT_BROADCAST_PORT: u16 = 47500;

pub const DEFAULT_BIND_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Clipboard polling interval (twice per second).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_RECONNECT_INITIAL: Duration = Duration::from_millis(500);

pub const DEFAULT_RECONNECT_MAX: Duration = Duration::from_secs(30);
