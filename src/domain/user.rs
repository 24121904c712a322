use serde::{Deserialize, Serialize};

/// Language assigned to a user on first contact, until they explicitly
/// change it.
pub const DEFAULT_LANG: &str = "en";

/// Durable record of anyone who has ever contacted the broker.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub lang: String,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

/// Identity attached to an inbound chat event.
#[derive(Debug, PartialEq, Clone)]
pub struct ActorProfile {
    pub id: i64,
    pub name: String,
}

impl ActorProfile {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Capability attached to a transition request. The lifecycle engine
/// checks this itself instead of comparing raw ids in control flow.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ActorRole {
    Admin,
    Member,
}
