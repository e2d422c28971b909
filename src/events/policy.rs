use std::{str::FromStr, sync::Arc};

use serde::Deserialize;
use thiserror::Error;

use crate::{auth::repo_types::User, events::repo_types::Event};

/// Decides whether a caller may change an event or manage its attendees.
pub trait EventPolicy: Send + Sync {
    fn can_modify(&self, actor: &User, event: &Event) -> bool;
}

/// Any authenticated caller may modify any event.
pub struct OpenCollaboration;

impl EventPolicy for OpenCollaboration {
    fn can_modify(&self, _actor: &User, _event: &Event) -> bool {
        true
    }
}

/// Only the event's owner may modify it.
pub struct OwnerOnly;

impl EventPolicy for OwnerOnly {
    fn can_modify(&self, actor: &User, event: &Event) -> bool {
        actor.id == event.owner_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPolicyKind {
    Open,
    Owner,
}

#[derive(Debug, Error)]
#[error("unknown event policy {0:?}; expected \"open\" or \"owner\"")]
pub struct UnknownPolicy(String);

impl FromStr for EventPolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "owner" => Ok(Self::Owner),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl EventPolicyKind {
    pub fn build(self) -> Arc<dyn EventPolicy> {
        match self {
            Self::Open => Arc::new(OpenCollaboration),
            Self::Owner => Arc::new(OwnerOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn user(id: i64) -> User {
        User {
            id,
            email: format!("u{id}@x.com"),
            name: "User".into(),
            password_hash: String::new(),
        }
    }

    fn event(owner_id: i64) -> Event {
        Event {
            id: 1,
            owner_id,
            name: "Meetup".into(),
            description: "A long enough description".into(),
            date: date!(2026 - 11 - 01),
            location: "Hall".into(),
        }
    }

    #[test]
    fn open_allows_everyone() {
        assert!(OpenCollaboration.can_modify(&user(2), &event(1)));
    }

    #[test]
    fn owner_only_checks_owner() {
        assert!(OwnerOnly.can_modify(&user(1), &event(1)));
        assert!(!OwnerOnly.can_modify(&user(2), &event(1)));
    }

    #[test]
    fn parse_policy_kind() {
        assert_eq!("open".parse::<EventPolicyKind>().unwrap(), EventPolicyKind::Open);
        assert_eq!(" Owner ".parse::<EventPolicyKind>().unwrap(), EventPolicyKind::Owner);
        assert!("admins".parse::<EventPolicyKind>().is_err());
    }
}
