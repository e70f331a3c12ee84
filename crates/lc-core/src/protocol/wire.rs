use thiserror::Error;

use crate::history::ClipboardEntry;
use crate::ids::NodeId;

/// Frames larger than this are refused by both ends.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

const SEPARATOR: char = ' ';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("payload has no origin separator")]
    MissingSeparator,

    #[error("payload has an empty origin label")]
    EmptyOrigin,

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A clipboard change as carried between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastMessage {
    pub value: String,
    pub origin: NodeId,
}

impl BroadcastMessage {
    pub fn new(value: impl Into<String>, origin: NodeId) -> Self {
        Self {
            value: value.into(),
            origin,
        }
    }

    pub fn encode(&self) -> String {
        format!("{}{}{}", self.value, SEPARATOR, self.origin)
    }

    /// Split the payload on its last space: everything before is the value,
    /// everything after is the origin label.
    pub fn decode(payload: &str) -> Result<Self, WireError> {
        let (value, origin) = payload
            .rsplit_once(SEPARATOR)
            .ok_or(WireError::MissingSeparator)?;
        if origin.is_empty() {
            return Err(WireError::EmptyOrigin);
        }

        Ok(Self {
            value: value.to_string(),
            origin: NodeId::new(origin),
        })
    }

    pub fn decode_bytes(payload: &[u8]) -> Result<Self, WireError> {
        let text = std::str::from_utf8(payload).map_err(|_| WireError::InvalidUtf8)?;
        Self::decode(text)
    }
}

impl From<&ClipboardEntry> for BroadcastMessage {
    fn from(entry: &ClipboardEntry) -> Self {
        Self::new(entry.value.clone(), entry.origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_splits_on_last_space() {
        let message = BroadcastMessage::decode("hello world bob").expect("decode");
        assert_eq!(message.value, "hello world");
        assert_eq!(message.origin, NodeId::new("bob"));
    }

    #[test]
    fn test_decode_allows_empty_value() {
        let message = BroadcastMessage::decode(" bob").expect("decode");
        assert_eq!(message.value, "");
        assert_eq!(message.origin.as_str(), "bob");
    }

    #[test]
    fn test_decode_keeps_newlines_and_inner_spaces() {
        let message = BroadcastMessage::decode("line one\nline  two alice").expect("decode");
        assert_eq!(message.value, "line one\nline  two");
        assert_eq!(message.origin.as_str(), "alice");
    }

    #[test]
    fn test_value_ending_in_space_survives_encoding() {
        let original = BroadcastMessage::new("trailing ", NodeId::new("alice"));
        let decoded = BroadcastMessage::decode(&original.encode()).expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        assert_eq!(
            BroadcastMessage::decode("nospace"),
            Err(WireError::MissingSeparator)
        );
        assert_eq!(BroadcastMessage::decode("value "), Err(WireError::EmptyOrigin));
        assert_eq!(
            BroadcastMessage::decode_bytes(&[0x66, 0x20, 0xff]),
            Err(WireError::InvalidUtf8)
        );
    }

    #[test]
    fn test_from_entry() {
        let entry = ClipboardEntry::new("copied", NodeId::new("desk"));
        let message = BroadcastMessage::from(&entry);
        assert_eq!(message.encode(), "copied desk");
    }
}
