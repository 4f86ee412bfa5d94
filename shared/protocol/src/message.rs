use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::message_type::MessageType;
use crate::messages::{
    AuthenticateMsg, AuthenticatedMsg, ErrorMsg, IceMsg, OnlineStatusMsg, PeerMsg, RoomIceMsg,
    RoomMemberMsg, RoomMsg, RoomRosterMsg, RoomSdpMsg, SdpMsg,
};

/// Declares `Message`, its type mapping, and its JSON payload codec from one
/// table so the three can never drift apart.
macro_rules! define_messages {
    (
        $( $variant:ident ( $payload:ty ) ),* $(,)?
        ; units: $( $unit:ident ),* $(,)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $variant($payload), )*
            $( $unit, )*
        }

        impl Message {
            pub fn message_type(&self) -> MessageType {
                match self {
                    $( Message::$variant(_) => MessageType::$variant, )*
                    $( Message::$unit => MessageType::$unit, )*
                }
            }

            /// JSON payload of the frame, without the type byte.
            pub fn to_payload(&self) -> Result<Vec<u8>> {
                let bytes = match self {
                    $( Message::$variant(inner) => serde_json::to_vec(inner)?, )*
                    $( Message::$unit => b"{}".to_vec(), )*
                };
                Ok(bytes)
            }

            /// Decodes a payload for an already-identified message type.
            pub fn from_payload(msg_type: MessageType, payload: &[u8]) -> Result<Self> {
                match msg_type {
                    $( MessageType::$variant => Ok(Message::$variant(serde_json::from_slice(payload)?)), )*
                    $( MessageType::$unit => {
                        // Contents are ignored, but the payload must still be JSON.
                        serde_json::from_slice::<Value>(payload)?;
                        Ok(Message::$unit)
                    } )*
                }
            }
        }
    };
}

define_messages! {
    Authenticate(AuthenticateMsg),
    RequestSession(PeerMsg),
    AcceptSession(PeerMsg),
    RejectSession(PeerMsg),
    EndSession(PeerMsg),
    Offer(SdpMsg),
    Answer(SdpMsg),
    IceCandidate(IceMsg),
    IsOnline(PeerMsg),
    JoinRoom(RoomMsg),
    LeaveRoom(RoomMsg),
    VoiceOffer(RoomSdpMsg),
    VoiceAnswer(RoomSdpMsg),
    VoiceIceCandidate(RoomIceMsg),

    Authenticated(AuthenticatedMsg),
    SessionRequested(PeerMsg),
    SessionAccepted(PeerMsg),
    SessionRejected(PeerMsg),
    SessionEnded(PeerMsg),
    PeerUnavailable(PeerMsg),
    OfferReceived(SdpMsg),
    AnswerReceived(SdpMsg),
    IceCandidateReceived(IceMsg),
    PeerDisconnected(PeerMsg),
    OnlineStatus(OnlineStatusMsg),
    RoomRoster(RoomRosterMsg),
    RoomUserJoined(RoomMemberMsg),
    RoomUserLeft(RoomMemberMsg),
    VoiceOfferReceived(RoomSdpMsg),
    VoiceAnswerReceived(RoomSdpMsg),
    VoiceIceCandidateReceived(RoomIceMsg),
    Error(ErrorMsg),
    ; units: Heartbeat
}

impl Message {
    /// Short human-readable label for log lines. Never includes payload text.
    pub fn label(&self) -> String {
        format!("{:?}", self.message_type())
    }
}

impl TryFrom<(u8, &[u8])> for Message {
    type Error = ProtocolError;

    fn try_from((code, payload): (u8, &[u8])) -> Result<Self> {
        let msg_type = MessageType::from_u8(code).ok_or(ProtocolError::InvalidMessageType(code))?;
        Message::from_payload(msg_type, payload)
    }
}
