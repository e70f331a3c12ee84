//! # Node Dependencies / 节点依赖
//!
//! Parameter grouping for [`crate::start_node`]. Not a builder: no defaults,
//! no optional fields, no hidden logic.

use std::sync::Arc;

use lc_core::ports::{
    BroadcastPublisherPort, BroadcastSubscriberPort, DiscoveryPort, ServiceRegistryPort,
    SystemClipboardPort,
};
use lc_core::{NodeIdentity, NodeSettings};

/// Everything a node needs to run.
/// 节点运行所需的全部依赖。
///
/// The publisher is already bound when it is handed over: a bind failure is
/// fatal and must surface before any task starts.
pub struct NodeDeps {
    pub identity: NodeIdentity,
    pub settings: NodeSettings,

    // Clipboard / 剪贴板
    pub clipboard: Arc<dyn SystemClipboardPort>,

    // Discovery / 发现
    pub registry: Arc<dyn ServiceRegistryPort>,
    pub discovery: Arc<dyn DiscoveryPort>,

    // Broadcast / 广播
    pub publisher: Arc<dyn BroadcastPublisherPort>,
    pub connector: Arc<dyn BroadcastSubscriberPort>,
}
