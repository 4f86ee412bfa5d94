//! Bearer token → participant id resolution.

use std::collections::HashMap;

use crate::domain::ParticipantId;

/// Resolves the bearer token a connection presents into the participant it
/// authenticates. Token issuance lives elsewhere.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<ParticipantId>;
}

/// Fixed token table, typically taken from the relay configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, ParticipantId>,
}

impl StaticTokenProvider {
    pub fn new(tokens: HashMap<String, ParticipantId>) -> Self {
        StaticTokenProvider { tokens }
    }

    pub fn with_token(mut self, token: &str, participant: &str) -> Self {
        self.tokens.insert(token.to_string(), participant.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn resolve(&self, token: &str) -> Option<ParticipantId> {
        if token.is_empty() {
            return None;
        }
        self.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_token() {
        let provider = StaticTokenProvider::default().with_token("secret-a", "alice");
        assert_eq!(provider.resolve("secret-a"), Some("alice".to_string()));
        assert_eq!(provider.resolve("secret-b"), None);
    }

    #[test]
    fn test_empty_token_never_resolves() {
        let provider = StaticTokenProvider::default().with_token("", "ghost");
        assert_eq!(provider.resolve(""), None);
    }
}
