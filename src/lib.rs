//! LanClip binary support: bootstrap of a single node process.

pub mod bootstrap;
