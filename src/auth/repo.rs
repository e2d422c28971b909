use async_trait::async_trait;

use crate::{auth::repo_types::User, db::Db, error::StoreError};

/// Persistence for user identities and their password hashes.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user; a taken email surfaces as [`StoreError::UniqueViolation`].
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: Db,
}

impl PgUserRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User, StoreError> {
        self.db
            .run(
                "users.create",
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (email, name, password_hash)
                    VALUES ($1, $2, $3)
                    RETURNING id, email, name, password_hash
                    "#,
                )
                .bind(email)
                .bind(name)
                .bind(password_hash)
                .fetch_one(&self.db.pool),
            )
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.db
            .run(
                "users.find_by_email",
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT id, email, name, password_hash
                    FROM users
                    WHERE email = $1
                    "#,
                )
                .bind(email)
                .fetch_optional(&self.db.pool),
            )
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.db
            .run(
                "users.find_by_id",
                sqlx::query_as::<_, User>(
                    r#"SELECT id, email, name, password_hash FROM users WHERE id = $1"#,
                )
                .bind(id)
                .fetch_optional(&self.db.pool),
            )
            .await
    }
}
