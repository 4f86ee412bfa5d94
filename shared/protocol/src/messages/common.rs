use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticateMsg {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedMsg {
    pub participant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineStatusMsg {
    pub peer_id: String,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub code: u16,
    pub message: String,
}

impl ErrorMsg {
    pub fn unauthorized() -> Self {
        ErrorMsg {
            code: 401,
            message: "Not authenticated".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorMsg {
            code: 400,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        assert_eq!(ErrorMsg::unauthorized().code, 401);
        let err = ErrorMsg::bad_request("relay-only verb");
        assert_eq!(err.code, 400);
        assert_eq!(err.message, "relay-only verb");
    }
}
