//! In-process repositories backing `AppState::fake()` in tests.
//!
//! They mirror the schema's constraints: unique email, unique
//! (event_id, user_id), and cascading deletes from events and users.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    attendees::{repo::AttendeeRepo, repo_types::Attendee},
    auth::{repo::UserRepo, repo_types::User},
    error::StoreError,
    events::{
        repo::EventRepo,
        repo_types::{Event, EventFields},
    },
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    events: Vec<Event>,
    attendees: Vec<Attendee>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn attendee_rows(&self, event_id: i64, user_id: i64) -> usize {
        self.lock()
            .attendees
            .iter()
            .filter(|a| a.event_id == event_id && a.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let user = User {
            id: t.next_id(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl EventRepo for MemoryStore {
    async fn create(&self, owner_id: i64, fields: &EventFields) -> Result<Event, StoreError> {
        let mut t = self.lock();
        let event = Event {
            id: t.next_id(),
            owner_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            date: fields.date,
            location: fields.location.clone(),
        };
        t.events.push(event.clone());
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.lock().events.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self.lock().events.iter().find(|e| e.id == id).cloned())
    }

    async fn update(&self, id: i64, fields: &EventFields) -> Result<Option<Event>, StoreError> {
        let mut t = self.lock();
        let Some(event) = t.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        event.name = fields.name.clone();
        event.description = fields.description.clone();
        event.date = fields.date;
        event.location = fields.location.clone();
        Ok(Some(event.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.lock();
        let before = t.events.len();
        t.events.retain(|e| e.id != id);
        t.attendees.retain(|a| a.event_id != id);
        Ok(t.events.len() != before)
    }
}

#[async_trait]
impl AttendeeRepo for MemoryStore {
    async fn create(&self, event_id: i64, user_id: i64) -> Result<Attendee, StoreError> {
        let mut t = self.lock();
        if t
            .attendees
            .iter()
            .any(|a| a.event_id == event_id && a.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation("attendees_event_user_key".into()));
        }
        if !t.events.iter().any(|e| e.id == event_id) {
            return Err(StoreError::ForeignKeyViolation("attendees_event_fkey".into()));
        }
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::ForeignKeyViolation("attendees_user_fkey".into()));
        }
        let attendee = Attendee {
            id: t.next_id(),
            event_id,
            user_id,
        };
        t.attendees.push(attendee.clone());
        Ok(attendee)
    }

    async fn exists(&self, event_id: i64, user_id: i64) -> Result<bool, StoreError> {
        Ok(self.attendee_rows(event_id, user_id) > 0)
    }

    async fn list_users_for_event(&self, event_id: i64) -> Result<Vec<User>, StoreError> {
        let t = self.lock();
        Ok(t.attendees
            .iter()
            .filter(|a| a.event_id == event_id)
            .filter_map(|a| t.users.iter().find(|u| u.id == a.user_id).cloned())
            .collect())
    }

    async fn list_events_for_user(&self, user_id: i64) -> Result<Vec<Event>, StoreError> {
        let t = self.lock();
        Ok(t.attendees
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| t.events.iter().find(|e| e.id == a.event_id).cloned())
            .collect())
    }

    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), StoreError> {
        self.lock()
            .attendees
            .retain(|a| !(a.user_id == user_id && a.event_id == event_id));
        Ok(())
    }
}
