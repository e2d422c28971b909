use async_trait::async_trait;

use crate::{
    db::Db,
    error::StoreError,
    events::repo_types::{Event, EventFields},
};

#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn create(&self, owner_id: i64, fields: &EventFields) -> Result<Event, StoreError>;
    async fn list(&self) -> Result<Vec<Event>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, StoreError>;
    /// Returns `None` when no event has this id.
    async fn update(&self, id: i64, fields: &EventFields) -> Result<Option<Event>, StoreError>;
    /// Returns whether a row was removed. Attendance rows go with it.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgEventRepo {
    db: Db,
}

impl PgEventRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepo for PgEventRepo {
    async fn create(&self, owner_id: i64, fields: &EventFields) -> Result<Event, StoreError> {
        self.db
            .run(
                "events.create",
                sqlx::query_as::<_, Event>(
                    r#"
                    INSERT INTO events (owner_id, name, description, date, location)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, owner_id, name, description, date, location
                    "#,
                )
                .bind(owner_id)
                .bind(&fields.name)
                .bind(&fields.description)
                .bind(fields.date)
                .bind(&fields.location)
                .fetch_one(&self.db.pool),
            )
            .await
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        self.db
            .run(
                "events.list",
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, owner_id, name, description, date, location
                    FROM events
                    ORDER BY id
                    "#,
                )
                .fetch_all(&self.db.pool),
            )
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>, StoreError> {
        self.db
            .run(
                "events.find_by_id",
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, owner_id, name, description, date, location
                    FROM events
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.db.pool),
            )
            .await
    }

    async fn update(&self, id: i64, fields: &EventFields) -> Result<Option<Event>, StoreError> {
        self.db
            .run(
                "events.update",
                sqlx::query_as::<_, Event>(
                    r#"
                    UPDATE events
                       SET name = $1, description = $2, date = $3, location = $4
                     WHERE id = $5
                    RETURNING id, owner_id, name, description, date, location
                    "#,
                )
                .bind(&fields.name)
                .bind(&fields.description)
                .bind(fields.date)
                .bind(&fields.location)
                .bind(id)
                .fetch_optional(&self.db.pool),
            )
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = self
            .db
            .run(
                "events.delete",
                sqlx::query("DELETE FROM events WHERE id = $1")
                    .bind(id)
                    .execute(&self.db.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
