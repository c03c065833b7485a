use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateStatus, CandidateWithEmails, NewCandidate};
use crate::models::review::{FieldChanges, ReviewRecord};
use crate::models::scheduled_email::ScheduledEmail;
use crate::models::tag::Tag;
use crate::services::email_sequence::ScheduledEmailDraft;

/// Dashboard list filter. Age bounds are already translated to birth dates.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub status: Option<CandidateStatus>,
    pub city: Option<String>,
    pub born_on_or_after: Option<NaiveDate>,
    pub born_on_or_before: Option<NaiveDate>,
    pub search: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            status: None,
            city: None,
            born_on_or_after: None,
            born_on_or_before: None,
            search: None,
            offset: 0,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidatePage {
    pub candidates: Vec<CandidateWithEmails>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(Candidate),
    /// A candidate with the same email already exists.
    Existing(Uuid),
}

#[derive(Debug, Clone)]
pub enum TagInsert {
    Created(Tag),
    Existing(Tag),
}

/// Persistence for candidates, their email sequences and tags.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>>;

    /// Inserts unless the email is taken, in which case the existing id is
    /// returned. Safe against concurrent duplicate submissions.
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<InsertOutcome>;

    async fn bind_telegram_message(&self, id: Uuid, chat_id: i64, message_id: i64) -> Result<()>;

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<CandidatePage>;

    /// Distinct non-empty cities, sorted.
    async fn distinct_cities(&self) -> Result<Vec<String>>;

    /// Writes the review columns and `fields` in one update, but only while the
    /// candidate is still `PENDING`. Returns `None` when the candidate does not
    /// exist or has already been reviewed.
    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        fields: &FieldChanges,
    ) -> Result<Option<Candidate>>;

    /// Returns `None` when the candidate does not exist.
    async fn apply_field_changes(&self, id: Uuid, fields: &FieldChanges) -> Result<Option<Candidate>>;

    /// Records the external contact id and sequence start, then inserts the
    /// drafts, skipping any `(candidate, email_number)` that already exists.
    /// An existing start time is kept. Returns the number of rows inserted.
    async fn start_email_sequence(
        &self,
        id: Uuid,
        contact_id: Option<&str>,
        started_at: DateTime<Utc>,
        drafts: &[ScheduledEmailDraft],
    ) -> Result<u64>;

    /// Ordered by `email_number`.
    async fn scheduled_emails(&self, candidate_id: Uuid) -> Result<Vec<ScheduledEmail>>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn seed_tags(&self, names: &[&str]) -> Result<()>;

    async fn create_tag(&self, name: &str) -> Result<TagInsert>;
}
