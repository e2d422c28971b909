use std::sync::Arc;

use axum::extract::FromRef;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    attendees::{repo::AttendeeRepo, repo_types::Attendee},
    auth::{repo::UserRepo, repo_types::User},
    error::StoreError,
    events::{repo::EventRepo, repo_types::Event},
    state::AppState,
};

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("user {user_id} already attends event {event_id}")]
    AlreadyExists { event_id: i64, user_id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maintains the many-to-many "user attends event" relation.
///
/// At most one row exists per (event, user) pair. The existence check gives a
/// precise error early; the store's unique constraint is what guarantees it.
#[derive(Clone)]
pub struct AttendanceManager {
    events: Arc<dyn EventRepo>,
    users: Arc<dyn UserRepo>,
    attendees: Arc<dyn AttendeeRepo>,
}

impl FromRef<AppState> for AttendanceManager {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.events.clone(),
            state.users.clone(),
            state.attendees.clone(),
        )
    }
}

impl AttendanceManager {
    pub fn new(
        events: Arc<dyn EventRepo>,
        users: Arc<dyn UserRepo>,
        attendees: Arc<dyn AttendeeRepo>,
    ) -> Self {
        Self {
            events,
            users,
            attendees,
        }
    }

    pub async fn add_attendee(&self, event_id: i64, user_id: i64) -> Result<Attendee, AttendanceError> {
        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(AttendanceError::EventNotFound(event_id));
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AttendanceError::UserNotFound(user_id));
        }
        if self.attendees.exists(event_id, user_id).await? {
            return Err(AttendanceError::AlreadyExists { event_id, user_id });
        }

        match self.attendees.create(event_id, user_id).await {
            Ok(attendee) => {
                info!(event_id, user_id, attendee_id = attendee.id, "attendee added");
                Ok(attendee)
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                warn!(event_id, user_id, %constraint, "attendee added concurrently");
                Err(AttendanceError::AlreadyExists { event_id, user_id })
            }
            // Parent row deleted after the checks above.
            Err(StoreError::ForeignKeyViolation(constraint)) if constraint == "attendees_user_fkey" => {
                warn!(event_id, user_id, "user removed before attendee insert");
                Err(AttendanceError::UserNotFound(user_id))
            }
            Err(StoreError::ForeignKeyViolation(_)) => {
                warn!(event_id, user_id, "event removed before attendee insert");
                Err(AttendanceError::EventNotFound(event_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_attendees_for_event(&self, event_id: i64) -> Result<Vec<User>, AttendanceError> {
        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(AttendanceError::EventNotFound(event_id));
        }
        let users = self.attendees.list_users_for_event(event_id).await?;
        debug!(event_id, count = users.len(), "listed attendees");
        Ok(users)
    }

    pub async fn list_events_for_user(&self, user_id: i64) -> Result<Vec<Event>, AttendanceError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AttendanceError::UserNotFound(user_id));
        }
        let events = self.attendees.list_events_for_user(user_id).await?;
        debug!(user_id, count = events.len(), "listed events for attendee");
        Ok(events)
    }

    pub async fn remove_attendee(&self, user_id: i64, event_id: i64) -> Result<(), AttendanceError> {
        self.attendees.delete(user_id, event_id).await?;
        info!(event_id, user_id, "attendee removed");
        Ok(())
    }
}
