use signaling_protocol::{
    CandidateInit, IceMsg, Message, OpaquePayload, PeerMsg, RoomIceMsg, RoomSdpMsg, SdpMsg,
};

use super::{ChannelId, ParticipantId};

/// Whether a negotiation verb belongs to a direct session or to a room mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Direct,
    Room(ChannelId),
}

/// A point-to-point verb on its way from one participant to another.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayVerb {
    RequestSession,
    AcceptSession,
    RejectSession,
    EndSession,
    Offer(Scope, OpaquePayload),
    Answer(Scope, OpaquePayload),
    IceCandidate(Scope, CandidateInit),
}

impl RelayVerb {
    pub fn name(&self) -> &'static str {
        match self {
            RelayVerb::RequestSession => "session request",
            RelayVerb::AcceptSession => "session accept",
            RelayVerb::RejectSession => "session reject",
            RelayVerb::EndSession => "session end",
            RelayVerb::Offer(Scope::Direct, _) => "SDP offer",
            RelayVerb::Answer(Scope::Direct, _) => "SDP answer",
            RelayVerb::IceCandidate(Scope::Direct, _) => "ICE candidate",
            RelayVerb::Offer(Scope::Room(_), _) => "voice SDP offer",
            RelayVerb::Answer(Scope::Room(_), _) => "voice SDP answer",
            RelayVerb::IceCandidate(Scope::Room(_), _) => "voice ICE candidate",
        }
    }

    /// Session-establishing verbs report an unreachable target back to the
    /// source; everything else is dropped quietly.
    pub fn reports_unavailable(&self) -> bool {
        matches!(self, RelayVerb::RequestSession)
    }

    /// ICE candidates are frequent enough that they only show at debug level.
    pub fn is_chatty(&self) -> bool {
        matches!(self, RelayVerb::IceCandidate(..))
    }

    /// The message the target receives, attributed to `source`.
    pub fn deliver_from(self, source: &ParticipantId) -> Message {
        let peer_id = source.clone();
        match self {
            RelayVerb::RequestSession => Message::SessionRequested(PeerMsg { peer_id }),
            RelayVerb::AcceptSession => Message::SessionAccepted(PeerMsg { peer_id }),
            RelayVerb::RejectSession => Message::SessionRejected(PeerMsg { peer_id }),
            RelayVerb::EndSession => Message::SessionEnded(PeerMsg { peer_id }),
            RelayVerb::Offer(Scope::Direct, sdp) => Message::OfferReceived(SdpMsg { peer_id, sdp }),
            RelayVerb::Answer(Scope::Direct, sdp) => {
                Message::AnswerReceived(SdpMsg { peer_id, sdp })
            }
            RelayVerb::IceCandidate(Scope::Direct, candidate) => {
                Message::IceCandidateReceived(IceMsg { peer_id, candidate })
            }
            RelayVerb::Offer(Scope::Room(channel_id), sdp) => {
                Message::VoiceOfferReceived(RoomSdpMsg {
                    channel_id,
                    peer_id,
                    sdp,
                })
            }
            RelayVerb::Answer(Scope::Room(channel_id), sdp) => {
                Message::VoiceAnswerReceived(RoomSdpMsg {
                    channel_id,
                    peer_id,
                    sdp,
                })
            }
            RelayVerb::IceCandidate(Scope::Room(channel_id), candidate) => {
                Message::VoiceIceCandidateReceived(RoomIceMsg {
                    channel_id,
                    peer_id,
                    candidate,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_attributed_to_source() {
        let delivered = RelayVerb::RequestSession.deliver_from(&"alice".to_string());
        assert_eq!(delivered, Message::SessionRequested(PeerMsg::new("alice")));
    }

    #[test]
    fn test_room_scope_maps_to_voice_verbs() {
        let verb = RelayVerb::Answer(Scope::Room("lobby".into()), OpaquePayload::new("v=0"));
        assert_eq!(verb.name(), "voice SDP answer");

        match verb.deliver_from(&"bob".to_string()) {
            Message::VoiceAnswerReceived(msg) => {
                assert_eq!(msg.channel_id, "lobby");
                assert_eq!(msg.peer_id, "bob");
            }
            other => panic!("unexpected delivery: {:?}", other),
        }
    }

    #[test]
    fn test_only_requests_report_unavailable() {
        assert!(RelayVerb::RequestSession.reports_unavailable());
        assert!(!RelayVerb::EndSession.reports_unavailable());
        assert!(
            !RelayVerb::Offer(Scope::Direct, OpaquePayload::default()).reports_unavailable()
        );
    }
}
