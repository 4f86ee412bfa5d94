use serde::{Deserialize, Serialize};

use super::OpaquePayload;

/// Session description addressed to (or received from) `peer_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdpMsg {
    pub peer_id: String,
    pub sdp: OpaquePayload,
}

/// An ICE candidate as produced by the local stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInit {
    pub candidate: OpaquePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u16>,
}

impl CandidateInit {
    pub fn new(candidate: impl Into<OpaquePayload>) -> Self {
        CandidateInit {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceMsg {
    pub peer_id: String,
    pub candidate: CandidateInit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_optional_fields_omitted() {
        let msg = IceMsg {
            peer_id: "bob".into(),
            candidate: CandidateInit::new("candidate:0 1 UDP 1 192.0.2.1 9 typ host"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("sdp_mid"));

        let parsed: IceMsg =
            serde_json::from_str(r#"{"peer_id":"bob","candidate":{"candidate":"c","sdp_mline_index":0}}"#)
                .unwrap();
        assert_eq!(parsed.candidate.sdp_mline_index, Some(0));
        assert_eq!(parsed.candidate.sdp_mid, None);
    }
}
