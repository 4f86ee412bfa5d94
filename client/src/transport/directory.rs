use std::collections::HashMap;

use signaling_protocol::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ParticipantId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Profile {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Stand-in used when the directory has no entry.
    pub fn placeholder(id: &str) -> Self {
        Profile::new(id, id)
    }
}

/// Participant id to display profile.
pub trait Directory: Send + Sync {
    fn lookup(&self, id: &str) -> Option<Profile>;
}

#[derive(Debug, Default)]
pub struct StaticDirectory {
    profiles: HashMap<ParticipantId, Profile>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }
}

impl Directory for StaticDirectory {
    fn lookup(&self, id: &str) -> Option<Profile> {
        self.profiles.get(id).cloned()
    }
}
