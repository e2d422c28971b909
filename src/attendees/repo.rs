use async_trait::async_trait;

use crate::{
    attendees::repo_types::Attendee, auth::repo_types::User, db::Db, error::StoreError,
    events::repo_types::Event,
};

#[async_trait]
pub trait AttendeeRepo: Send + Sync {
    /// Insert the pair; an existing pair surfaces as [`StoreError::UniqueViolation`].
    async fn create(&self, event_id: i64, user_id: i64) -> Result<Attendee, StoreError>;
    async fn exists(&self, event_id: i64, user_id: i64) -> Result<bool, StoreError>;
    async fn list_users_for_event(&self, event_id: i64) -> Result<Vec<User>, StoreError>;
    async fn list_events_for_user(&self, user_id: i64) -> Result<Vec<Event>, StoreError>;
    /// Deleting a pair that does not exist is not an error.
    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgAttendeeRepo {
    db: Db,
}

impl PgAttendeeRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendeeRepo for PgAttendeeRepo {
    async fn create(&self, event_id: i64, user_id: i64) -> Result<Attendee, StoreError> {
        self.db
            .run(
                "attendees.create",
                sqlx::query_as::<_, Attendee>(
                    r#"
                    INSERT INTO attendees (event_id, user_id)
                    VALUES ($1, $2)
                    RETURNING id, event_id, user_id
                    "#,
                )
                .bind(event_id)
                .bind(user_id)
                .fetch_one(&self.db.pool),
            )
            .await
    }

    async fn exists(&self, event_id: i64, user_id: i64) -> Result<bool, StoreError> {
        self.db
            .run(
                "attendees.exists",
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM attendees WHERE event_id = $1 AND user_id = $2
                    )
                    "#,
                )
                .bind(event_id)
                .bind(user_id)
                .fetch_one(&self.db.pool),
            )
            .await
    }

    async fn list_users_for_event(&self, event_id: i64) -> Result<Vec<User>, StoreError> {
        self.db
            .run(
                "attendees.list_users_for_event",
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT u.id, u.email, u.name, u.password_hash
                      FROM users u
                      JOIN attendees a ON a.user_id = u.id
                     WHERE a.event_id = $1
                    "#,
                )
                .bind(event_id)
                .fetch_all(&self.db.pool),
            )
            .await
    }

    async fn list_events_for_user(&self, user_id: i64) -> Result<Vec<Event>, StoreError> {
        self.db
            .run(
                "attendees.list_events_for_user",
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT e.id, e.owner_id, e.name, e.description, e.date, e.location
                      FROM events e
                      JOIN attendees a ON a.event_id = e.id
                     WHERE a.user_id = $1
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.db.pool),
            )
            .await
    }

    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), StoreError> {
        self.db
            .run(
                "attendees.delete",
                sqlx::query("DELETE FROM attendees WHERE user_id = $1 AND event_id = $2")
                    .bind(user_id)
                    .bind(event_id)
                    .execute(&self.db.pool),
            )
            .await?;
        Ok(())
    }
}
