use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the "user attends event" relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Attendee {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
}
