//! Opaque locators pointing back at the source message of a file

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};

/// The chat and message a file was posted in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub chat_id: i64,
    pub msg_id: i64,
}

impl SourceRef {
    pub fn new(chat_id: i64, msg_id: i64) -> Self {
        Self { chat_id, msg_id }
    }
}

/// Turns a [`SourceRef`] into the string stored on a record
pub trait LocatorEncoder: Send + Sync {
    fn encode(&self, source: &SourceRef) -> String;
}

/// URL-safe base64 of the JSON form `{"chat_id":..,"msg_id":..}`
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64LocatorEncoder;

impl Base64LocatorEncoder {
    /// Inverse of [`LocatorEncoder::encode`]
    pub fn decode(&self, locator: &str) -> Option<SourceRef> {
        let bytes = URL_SAFE.decode(locator).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

impl LocatorEncoder for Base64LocatorEncoder {
    fn encode(&self, source: &SourceRef) -> String {
        // Serializing two integers cannot fail
        let json = serde_json::to_vec(source).unwrap_or_default();
        URL_SAFE.encode(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_url_safe_json() {
        let encoder = Base64LocatorEncoder;
        let source = SourceRef::new(-1001234567890, 42);
        let encoded = encoder.encode(&source);

        assert!(!encoded.contains('+') && !encoded.contains('/'));
        let raw = URL_SAFE.decode(&encoded).unwrap();
        assert_eq!(
            String::from_utf8(raw).unwrap(),
            r#"{"chat_id":-1001234567890,"msg_id":42}"#
        );
        assert_eq!(encoder.decode(&encoded), Some(source));
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(Base64LocatorEncoder.decode("not base64!"), None);
    }
}
