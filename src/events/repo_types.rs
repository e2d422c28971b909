use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub location: String,
}

/// Caller-supplied fields of an event; id and owner come from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub location: String,
}
