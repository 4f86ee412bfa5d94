#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // Client → relay
    Authenticate = 0x01,
    RequestSession = 0x02,
    AcceptSession = 0x03,
    RejectSession = 0x04,
    EndSession = 0x05,
    Offer = 0x06,
    Answer = 0x07,
    IceCandidate = 0x08,
    IsOnline = 0x09,
    JoinRoom = 0x0A,
    LeaveRoom = 0x0B,
    VoiceOffer = 0x0C,
    VoiceAnswer = 0x0D,
    VoiceIceCandidate = 0x0E,
    Heartbeat = 0x0F,

    // Relay → client
    Authenticated = 0x21,
    SessionRequested = 0x22,
    SessionAccepted = 0x23,
    SessionRejected = 0x24,
    SessionEnded = 0x25,
    PeerUnavailable = 0x26,
    OfferReceived = 0x27,
    AnswerReceived = 0x28,
    IceCandidateReceived = 0x29,
    PeerDisconnected = 0x2A,
    OnlineStatus = 0x2B,
    RoomRoster = 0x2C,
    RoomUserJoined = 0x2D,
    RoomUserLeft = 0x2E,
    VoiceOfferReceived = 0x2F,
    VoiceAnswerReceived = 0x30,
    VoiceIceCandidateReceived = 0x31,
    Error = 0x3F,
}

impl MessageType {
    const ALL: [MessageType; 33] = [
        MessageType::Authenticate,
        MessageType::RequestSession,
        MessageType::AcceptSession,
        MessageType::RejectSession,
        MessageType::EndSession,
        MessageType::Offer,
        MessageType::Answer,
        MessageType::IceCandidate,
        MessageType::IsOnline,
        MessageType::JoinRoom,
        MessageType::LeaveRoom,
        MessageType::VoiceOffer,
        MessageType::VoiceAnswer,
        MessageType::VoiceIceCandidate,
        MessageType::Heartbeat,
        MessageType::Authenticated,
        MessageType::SessionRequested,
        MessageType::SessionAccepted,
        MessageType::SessionRejected,
        MessageType::SessionEnded,
        MessageType::PeerUnavailable,
        MessageType::OfferReceived,
        MessageType::AnswerReceived,
        MessageType::IceCandidateReceived,
        MessageType::PeerDisconnected,
        MessageType::OnlineStatus,
        MessageType::RoomRoster,
        MessageType::RoomUserJoined,
        MessageType::RoomUserLeft,
        MessageType::VoiceOfferReceived,
        MessageType::VoiceAnswerReceived,
        MessageType::VoiceIceCandidateReceived,
        MessageType::Error,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as u8 == value)
    }

    /// Verbs a client may send to the relay.
    pub fn is_client_verb(self) -> bool {
        (self as u8) < 0x20
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_resolve() {
        let codes: HashSet<u8> = MessageType::ALL.iter().map(|t| *t as u8).collect();
        assert_eq!(codes.len(), MessageType::ALL.len());
        for t in MessageType::ALL {
            assert_eq!(MessageType::from_u8(t as u8), Some(t));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(MessageType::from_u8(0x00), None);
        assert_eq!(MessageType::from_u8(0xFF), None);
    }

    #[test]
    fn test_direction_split() {
        assert!(MessageType::Offer.is_client_verb());
        assert!(MessageType::Heartbeat.is_client_verb());
        assert!(!MessageType::OfferReceived.is_client_verb());
        assert!(!MessageType::Error.is_client_verb());
    }
}
