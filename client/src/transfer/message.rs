use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TransferError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum WireMessage {
    Text {
        id: String,
        sender_id: String,
        ts: i64,
        content: String,
    },
    FileMeta {
        id: String,
        sender_id: String,
        ts: i64,
        file_name: String,
        file_size: u64,
        mime_type: String,
        total_chunks: usize,
    },
    FileChunk {
        id: String,
        sender_id: String,
        ts: i64,
        index: usize,
        data: String,
    },
}

impl WireMessage {
    pub fn id(&self) -> &str {
        match self {
            WireMessage::Text { id, .. }
            | WireMessage::FileMeta { id, .. }
            | WireMessage::FileChunk { id, .. } => id,
        }
    }

    pub fn encode(&self) -> Result<String, TransferError> {
        serde_json::to_string(self).map_err(|e| TransferError::Malformed(e.to_string()))
    }

    pub fn decode(text: &str) -> Result<Self, TransferError> {
        serde_json::from_str(text).map_err(|e| TransferError::Malformed(e.to_string()))
    }
}

/// Random identifier for a text line or a file transfer.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_field_names_on_the_wire() {
        let meta = WireMessage::FileMeta {
            id: "f1".into(),
            sender_id: "alice".into(),
            ts: 1_700_000_000_000,
            file_name: "notes.txt".into(),
            file_size: 40_000,
            mime_type: "text/plain".into(),
            total_chunks: 3,
        };
        let json: Value = serde_json::from_str(&meta.encode().unwrap()).unwrap();

        assert_eq!(json["t"], "file-meta");
        assert_eq!(json["senderId"], "alice");
        assert_eq!(json["fileName"], "notes.txt");
        assert_eq!(json["mimeType"], "text/plain");
        assert_eq!(json["totalChunks"], 3);
    }

    #[test]
    fn test_decodes_text_from_peer() {
        let text = r#"{"t":"text","id":"m1","senderId":"bob","ts":5,"content":"hi"}"#;
        let decoded = WireMessage::decode(text).unwrap();
        assert_eq!(
            decoded,
            WireMessage::Text {
                id: "m1".into(),
                sender_id: "bob".into(),
                ts: 5,
                content: "hi".into(),
            }
        );
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let result = WireMessage::decode(r#"{"t":"file-cancel","id":"f1"}"#);
        assert!(matches!(result, Err(TransferError::Malformed(_))));
    }

    #[test]
    fn test_message_ids_are_v4_shaped() {
        let id = new_message_id();
        let groups: Vec<&str> = id.split('-').collect();

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(groups[2].starts_with('4'));
        assert_ne!(id, new_message_id());
    }
}
