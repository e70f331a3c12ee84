//! LanClip application orchestration layer
//!
//! Use cases (advertise, discover, subscribe, poll) and the single-owner
//! node runtime that serialises every mutation of history and peer set.

pub mod deps;
pub mod node;
pub mod runtime;
pub mod usecases;

pub use deps::NodeDeps;
pub use node::{start_node, RunningNode};
pub use runtime::{NodeHandle, PeerStatus};
