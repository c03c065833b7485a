//! In-process store with the same semantics as the Postgres one. Backs the
//! test suites and local runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{CandidateFilter, CandidatePage, CandidateStore, InsertOutcome, TagInsert};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus, CandidateWithEmails, NewCandidate};
use crate::models::review::{FieldChanges, ReviewRecord};
use crate::models::scheduled_email::{ScheduledEmail, ScheduledEmailStatus};
use crate::models::tag::Tag;
use crate::services::email_sequence::ScheduledEmailDraft;

#[derive(Default)]
struct MemoryState {
    candidates: Vec<Candidate>,
    emails: Vec<ScheduledEmail>,
    tags: Vec<Tag>,
}

impl MemoryState {
    fn candidate_mut(&mut self, id: Uuid) -> Option<&mut Candidate> {
        self.candidates.iter_mut().find(|c| c.id == id)
    }

    fn emails_of(&self, candidate_id: Uuid) -> Vec<ScheduledEmail> {
        let mut emails: Vec<ScheduledEmail> = self
            .emails
            .iter()
            .filter(|e| e.candidate_id == candidate_id)
            .cloned()
            .collect();
        emails.sort_by_key(|e| e.email_number);
        emails
    }
}

#[derive(Default)]
pub struct MemoryCandidateStore {
    state: Mutex<MemoryState>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn apply_fields(candidate: &mut Candidate, fields: &FieldChanges) {
    if let Some(stage) = fields.sales_stage {
        candidate.sales_stage = stage;
    }
    if let Some(notes) = &fields.sales_notes {
        candidate.sales_notes = notes.clone();
    }
    if let Some(tags) = &fields.tags {
        candidate.tags = tags.clone();
    }
    candidate.updated_at = Utc::now();
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

fn matches(candidate: &Candidate, filter: &CandidateFilter) -> bool {
    if let Some(status) = filter.status {
        if candidate.status != status {
            return false;
        }
    }
    if let Some(city) = &filter.city {
        if !contains_ci(candidate.city.as_deref(), city) {
            return false;
        }
    }
    if let Some(bound) = filter.born_on_or_after {
        if !candidate.birth_date.is_some_and(|d| d >= bound) {
            return false;
        }
    }
    if let Some(bound) = filter.born_on_or_before {
        if !candidate.birth_date.is_some_and(|d| d <= bound) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let hit = contains_ci(Some(&candidate.first_name), search)
            || contains_ci(Some(&candidate.last_name), search)
            || contains_ci(Some(&candidate.email), search)
            || contains_ci(candidate.phone.as_deref(), search);
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let state = self.lock()?;
        Ok(state.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn find_candidate_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let state = self.lock()?;
        Ok(state.candidates.iter().find(|c| c.email == email).cloned())
    }

    async fn insert_candidate(&self, new: NewCandidate) -> Result<InsertOutcome> {
        let mut state = self.lock()?;
        if let Some(existing) = state.candidates.iter().find(|c| c.email == new.email) {
            return Ok(InsertOutcome::Existing(existing.id));
        }

        let now = Utc::now();
        let candidate = Candidate {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            birth_date: new.birth_date,
            height_cm: new.height_cm,
            instagram: new.instagram,
            tiktok: new.tiktok,
            city: new.city,
            category: new.category,
            photo_urls: new.photo_urls,
            submitted_at: new.submitted_at,
            status: CandidateStatus::Pending,
            reviewed_at: None,
            reviewed_by: None,
            brevo_contact_id: None,
            email_sequence_started_at: None,
            telegram_message_id: None,
            telegram_chat_id: None,
            sales_stage: None,
            sales_notes: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.candidates.push(candidate.clone());
        Ok(InsertOutcome::Created(candidate))
    }

    async fn bind_telegram_message(&self, id: Uuid, chat_id: i64, message_id: i64) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(candidate) = state.candidate_mut(id) {
            candidate.telegram_chat_id = Some(chat_id);
            candidate.telegram_message_id = Some(message_id);
            candidate.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<CandidatePage> {
        let state = self.lock()?;
        let mut hits: Vec<&Candidate> = state
            .candidates
            .iter()
            .filter(|c| matches(c, filter))
            .collect();
        hits.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let total = hits.len() as i64;
        let candidates = hits
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|c| CandidateWithEmails {
                candidate: c.clone(),
                scheduled_emails: state.emails_of(c.id),
            })
            .collect();

        Ok(CandidatePage { candidates, total })
    }

    async fn distinct_cities(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        let mut cities: Vec<String> = state
            .candidates
            .iter()
            .filter_map(|c| c.city.clone())
            .filter(|city| !city.is_empty())
            .collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }

    async fn apply_review(
        &self,
        id: Uuid,
        review: &ReviewRecord,
        fields: &FieldChanges,
    ) -> Result<Option<Candidate>> {
        let mut state = self.lock()?;
        let Some(candidate) = state.candidate_mut(id) else {
            return Ok(None);
        };
        if candidate.status != CandidateStatus::Pending {
            return Ok(None);
        }
        candidate.status = review.status;
        candidate.reviewed_at = Some(review.reviewed_at);
        candidate.reviewed_by = Some(review.reviewed_by.clone());
        apply_fields(candidate, fields);
        Ok(Some(candidate.clone()))
    }

    async fn apply_field_changes(&self, id: Uuid, fields: &FieldChanges) -> Result<Option<Candidate>> {
        let mut state = self.lock()?;
        let Some(candidate) = state.candidate_mut(id) else {
            return Ok(None);
        };
        apply_fields(candidate, fields);
        Ok(Some(candidate.clone()))
    }

    async fn start_email_sequence(
        &self,
        id: Uuid,
        contact_id: Option<&str>,
        started_at: DateTime<Utc>,
        drafts: &[ScheduledEmailDraft],
    ) -> Result<u64> {
        let mut state = self.lock()?;
        let Some(candidate) = state.candidate_mut(id) else {
            return Err(Error::NotFound("Candidate not found".to_string()));
        };
        if let Some(contact_id) = contact_id {
            candidate.brevo_contact_id = Some(contact_id.to_string());
        }
        if candidate.email_sequence_started_at.is_none() {
            candidate.email_sequence_started_at = Some(started_at);
        }
        candidate.updated_at = Utc::now();

        let now = Utc::now();
        let mut inserted = 0;
        for draft in drafts {
            let exists = state
                .emails
                .iter()
                .any(|e| e.candidate_id == id && e.email_number == draft.email_number);
            if exists {
                continue;
            }
            state.emails.push(ScheduledEmail {
                id: Uuid::new_v4(),
                candidate_id: id,
                email_number: draft.email_number,
                template_id: draft.template_id,
                subject: draft.subject.clone(),
                scheduled_for: draft.scheduled_for,
                status: ScheduledEmailStatus::Scheduled,
                sent_at: None,
                created_at: now,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn scheduled_emails(&self, candidate_id: Uuid) -> Result<Vec<ScheduledEmail>> {
        let state = self.lock()?;
        Ok(state.emails_of(candidate_id))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let state = self.lock()?;
        let mut tags = state.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn seed_tags(&self, names: &[&str]) -> Result<()> {
        let mut state = self.lock()?;
        for name in names {
            if !state.tags.iter().any(|t| t.name == *name) {
                state.tags.push(Tag {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    created_at: Utc::now(),
                });
            }
        }
        Ok(())
    }

    async fn create_tag(&self, name: &str) -> Result<TagInsert> {
        let mut state = self.lock()?;
        if let Some(existing) = state.tags.iter().find(|t| t.name == name) {
            return Ok(TagInsert::Existing(existing.clone()));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.tags.push(tag.clone());
        Ok(TagInsert::Created(tag))
    }
}
