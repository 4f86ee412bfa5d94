use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStatus {
    #[default]
    Idle,
    Joining,
    Active,
    Failed,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Idle => "idle",
            RoomStatus::Joining => "joining",
            RoomStatus::Active => "active",
            RoomStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Health of the connection to one other room member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Failed,
}
