//! JSON encoding strategy.
//!
//! Anything whose bytes end up under a signature (`channel_data`, event
//! `data`, POST bodies) is encoded through a [`JsonEncoder`], so callers can
//! substitute their own deterministic encoder.

use serde_json::Value;

use crate::error::PusherResult;

/// Encodes JSON values to text.
pub trait JsonEncoder: Send + Sync {
    /// Encode `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn encode(&self, value: &Value) -> PusherResult<String>;
}

/// Compact encoder: no whitespace, object keys in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJsonEncoder;

impl JsonEncoder for CompactJsonEncoder {
    fn encode(&self, value: &Value) -> PusherResult<String> {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_encoding_preserves_key_order() {
        let value = json!({"user_id": "fred", "user_info": {"key": "value"}, "a": 1});
        assert_eq!(
            CompactJsonEncoder.encode(&value).unwrap(),
            r#"{"user_id":"fred","user_info":{"key":"value"},"a":1}"#
        );
    }
}
