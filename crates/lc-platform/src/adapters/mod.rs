//! # Platform Adapters / 平台适配器
//!
//! Implementations of the `lc-core` ports.
//! `lc-core` 端口的具体实现。
//!
//! # Modules / 模块
//!
//! - `mdns` - mDNS service registration and browsing (`mdns-sd`)
//! - `tcp_publisher` - TCP broadcast publisher, one length-delimited frame per message
//! - `tcp_subscriber` - TCP connector reading the publisher's frames
//! - `clipboard` - System clipboard via `clipboard-rs`
//! - `in_memory` - In-process LAN and clipboard for tests and demos

pub mod clipboard;
pub mod in_memory;
pub mod mdns;
pub mod tcp_publisher;
pub mod tcp_subscriber;

pub use clipboard::SystemClipboard;
pub use in_memory::{InMemoryClipboard, InMemoryLan};
pub use mdns::MdnsBackend;
pub use tcp_publisher::TcpPublisher;
pub use tcp_subscriber::TcpSubscriberConnector;
