use serde::{Deserialize, Serialize};
use std::fmt;

/// Negotiation text (session descriptions, ICE candidates) carried through the
/// relay untouched.
///
/// There is intentionally no `Display` impl, and `Debug` prints only the
/// length, so formatting a message for a log line cannot leak the content.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaquePayload(String);

impl OpaquePayload {
    pub fn new(content: impl Into<String>) -> Self {
        OpaquePayload(content.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for OpaquePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaquePayload(<{} bytes>)", self.0.len())
    }
}

impl From<String> for OpaquePayload {
    fn from(content: String) -> Self {
        OpaquePayload(content)
    }
}

impl From<&str> for OpaquePayload {
    fn from(content: &str) -> Self {
        OpaquePayload(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_content() {
        let payload = OpaquePayload::new("v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1");
        let printed = format!("{:?}", payload);

        assert!(!printed.contains("IN IP4"));
        assert!(printed.contains(&payload.len().to_string()));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let payload = OpaquePayload::from("candidate:1 1 udp 2122260223 10.0.0.2 5000 typ host");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, "\"candidate:1 1 udp 2122260223 10.0.0.2 5000 typ host\"");

        let back: OpaquePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
