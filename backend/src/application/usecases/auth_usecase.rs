//! Connection authentication.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};

use signaling_protocol::{AuthenticateMsg, AuthenticatedMsg, ErrorMsg, Message};

use crate::application::usecases::SignalingUseCase;
use crate::domain::{ConnectionId, ParticipantId};
use crate::infrastructure::IdentityProvider;

pub enum AuthOutcome {
    /// The connection is now registered; `receiver` is its outbound queue.
    Accepted {
        participant_id: ParticipantId,
        connection_id: ConnectionId,
        receiver: Receiver<Message>,
        response: Message,
    },
    Rejected(Message),
}

pub struct AuthUseCase {
    identity: Arc<dyn IdentityProvider>,
    signaling: SignalingUseCase,
    logger: logging::Logger,
}

impl AuthUseCase {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        signaling: SignalingUseCase,
        logger: logging::Logger,
    ) -> Self {
        AuthUseCase {
            identity,
            signaling,
            logger,
        }
    }

    /// Resolves the token and, on success, registers the connection.
    pub fn handle_authenticate(&self, req: &AuthenticateMsg) -> AuthOutcome {
        let Some(participant_id) = self.identity.resolve(&req.token) else {
            self.logger.warn("Authentication rejected: unknown token");
            return AuthOutcome::Rejected(Message::Error(ErrorMsg {
                code: 401,
                message: "Invalid token".to_string(),
            }));
        };

        let (tx, rx) = channel::<Message>();
        match self.signaling.register(&participant_id, tx) {
            Ok(connection_id) => {
                self.logger
                    .info(&format!("Participant {} authenticated", participant_id));
                AuthOutcome::Accepted {
                    response: Message::Authenticated(AuthenticatedMsg {
                        participant_id: participant_id.clone(),
                    }),
                    participant_id,
                    connection_id,
                    receiver: rx,
                }
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to register {}: {}", participant_id, e));
                AuthOutcome::Rejected(Message::Error(ErrorMsg {
                    code: 500,
                    message: "Registration failed".to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Registry, StaticTokenProvider};

    fn usecase(registry: &Registry) -> AuthUseCase {
        let identity = Arc::new(StaticTokenProvider::default().with_token("tok-alice", "alice"));
        let signaling = SignalingUseCase::new(registry.clone(), logging::Logger::disabled());
        AuthUseCase::new(identity, signaling, logging::Logger::disabled())
    }

    #[test]
    fn test_valid_token_registers_connection() {
        let registry = Registry::new();
        let outcome = usecase(&registry).handle_authenticate(&AuthenticateMsg {
            token: "tok-alice".into(),
        });

        match outcome {
            AuthOutcome::Accepted {
                participant_id,
                response,
                ..
            } => {
                assert_eq!(participant_id, "alice");
                assert!(matches!(response, Message::Authenticated(_)));
            }
            AuthOutcome::Rejected(msg) => panic!("rejected: {:?}", msg),
        }
        assert!(registry.is_registered(&"alice".to_string()));
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let registry = Registry::new();
        let outcome = usecase(&registry).handle_authenticate(&AuthenticateMsg {
            token: "forged".into(),
        });

        assert!(matches!(
            outcome,
            AuthOutcome::Rejected(Message::Error(ErrorMsg { code: 401, .. }))
        ));
        assert_eq!(registry.registered_count(), 0);
    }
}
