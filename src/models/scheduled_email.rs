use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scheduled_email_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduledEmailStatus {
    Scheduled,
    Sent,
    Failed,
}

/// Bookkeeping row for one step of a candidate's email sequence. Delivery
/// itself happens in the external automation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEmail {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub email_number: i32,
    pub template_id: i32,
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduledEmailStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
