use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Idle,
    Requesting,
    Incoming,
    Connecting,
    Active,
    Ended,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Requesting => "requesting",
            SessionStatus::Incoming => "incoming",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::Failed => "failed",
        }
    }

    /// The complete transition table. Nothing ever returns to `idle`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;

        matches!(
            (self, next),
            (_, Incoming)
                | (Idle, Requesting)
                | (Requesting, Connecting | Failed)
                | (Incoming, Connecting | Failed)
                | (Connecting, Active | Failed)
                | (Active, Ended)
        )
    }

    pub fn check_transition(self, next: SessionStatus) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Ended | SessionStatus::Failed)
    }

    /// A fresh request may replace a session in these states.
    pub fn is_replaceable(self) -> bool {
        matches!(self, SessionStatus::Idle) || self.is_terminal()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStatus::*;
    use super::*;

    const ALL: [SessionStatus; 7] = [Idle, Requesting, Incoming, Connecting, Active, Ended, Failed];

    #[test]
    fn test_only_listed_transitions_are_allowed() {
        let allowed = [
            (Idle, Requesting),
            (Requesting, Connecting),
            (Requesting, Failed),
            (Incoming, Connecting),
            (Incoming, Failed),
            (Connecting, Active),
            (Connecting, Failed),
            (Active, Ended),
        ];

        for from in ALL {
            for to in ALL {
                let expected = to == Incoming || allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_idle() {
        for from in ALL {
            assert!(from.check_transition(Idle).is_err());
        }
    }

    #[test]
    fn test_active_cannot_fail_directly() {
        let err = Active.check_transition(Failed).unwrap_err();
        assert_eq!(err.to_string(), "session cannot move from active to failed");
    }
}
