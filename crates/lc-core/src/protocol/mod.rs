//! Broadcast wire format.
//!
//! A clipboard change travels as the UTF-8 payload `"<value> <origin>"`,
//! one payload per length-delimited frame.

mod wire;

pub use wire::{BroadcastMessage, WireError, DEFAULT_MAX_FRAME_BYTES};
