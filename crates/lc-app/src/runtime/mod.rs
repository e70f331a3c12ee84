//! Node runtime: one owner task for history and peers, fed by an ordered
//! event channel.

pub mod event_bus;
mod handle;
mod node_runtime;

pub use event_bus::{NodeCommand, NodeEvent};
pub use handle::{NodeHandle, PeerStatus};
pub use node_runtime::NodeRuntime;
