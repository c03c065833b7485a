use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::CandidateStore;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus, CandidateWithEmails, Verdict};
use crate::models::review::{FieldChanges, ReviewChanges, ReviewRecord, DEFAULT_REVIEWER};
use crate::services::brevo_service::{ContactSync, ContactUpsert};
use crate::services::email_sequence::{plan_sequence, DEFAULT_SEQUENCE};
use crate::services::outcome::SideEffect;
use crate::services::telegram_service::Notifier;
use crate::utils::telegram_format::{
    already_reviewed_notice, callback_answer, status_banner, terse_status_banner, NOT_FOUND_NOTICE,
};
use crate::utils::time;

const CHAT_REVIEWER_FALLBACK: &str = "Telegram Admin";
const CHAT_BANNER_FALLBACK: &str = "Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum Transition {
    /// The candidate moved from `PENDING` to this status.
    Applied(CandidateStatus),
    /// The candidate was already reviewed; its status was left as is.
    AlreadyReviewed(CandidateStatus),
    /// No status was requested.
    FieldsOnly,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub candidate: CandidateWithEmails,
    pub transition: Transition,
    pub contact_sync: SideEffect,
    pub notification: SideEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVerb {
    Approve,
    Reject,
}

impl ChatVerb {
    pub fn verdict(self) -> Verdict {
        match self {
            ChatVerb::Approve => Verdict::Approved,
            ChatVerb::Reject => Verdict::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatReviewer {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl ChatReviewer {
    fn preferred(&self) -> Option<&str> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.first_name.as_deref().filter(|n| !n.is_empty()))
    }

    /// Stored as `reviewed_by`.
    pub fn reviewed_by(&self) -> String {
        self.preferred().unwrap_or(CHAT_REVIEWER_FALLBACK).to_string()
    }

    /// Shown in the verdict banner.
    pub fn display_name(&self) -> String {
        self.preferred().unwrap_or(CHAT_BANNER_FALLBACK).to_string()
    }
}

/// A pressed approve/reject button.
#[derive(Debug, Clone)]
pub struct ChatAction {
    pub verb: ChatVerb,
    pub candidate_id: Uuid,
    pub reviewer: ChatReviewer,
    pub chat_id: i64,
    pub message_id: i64,
    pub callback_query_id: String,
}

impl ChatAction {
    /// Decodes `"approve:<id>"` / `"reject:<id>"` callback data.
    pub fn parse_data(data: &str) -> Option<(ChatVerb, Uuid)> {
        let (verb, id) = data.split_once(':')?;
        let verb = match verb {
            "approve" => ChatVerb::Approve,
            "reject" => ChatVerb::Reject,
            _ => return None,
        };
        let id = Uuid::parse_str(id.trim()).ok()?;
        Some((verb, id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatActionOutcome {
    Resolved {
        status: CandidateStatus,
        contact_sync: SideEffect,
        notification: SideEffect,
    },
    AlreadyReviewed(CandidateStatus),
    NotFound,
}

fn candidate_not_found() -> Error {
    Error::NotFound("Candidate not found".to_string())
}

/// Approval workflow shared by the dashboard and the chat buttons.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn CandidateStore>,
    contacts: Arc<dyn ContactSync>,
    notifier: Arc<dyn Notifier>,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        contacts: Arc<dyn ContactSync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            contacts,
            notifier,
        }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<CandidateWithEmails> {
        let candidate = self
            .store
            .find_candidate(id)
            .await?
            .ok_or_else(candidate_not_found)?;
        self.with_emails(candidate).await
    }

    /// Dashboard review. A status, when present, is applied only to a
    /// `PENDING` candidate; field changes are applied either way.
    pub async fn review_candidate(
        &self,
        id: Uuid,
        changes: ReviewChanges,
        reviewer: Option<String>,
    ) -> Result<ReviewOutcome> {
        let current = self
            .store
            .find_candidate(id)
            .await?
            .ok_or_else(candidate_not_found)?;

        let Some(verdict) = changes.status else {
            let candidate = self.apply_fields_or_reload(current, &changes.fields).await?;
            return Ok(ReviewOutcome {
                candidate: self.with_emails(candidate).await?,
                transition: Transition::FieldsOnly,
                contact_sync: SideEffect::Skipped,
                notification: SideEffect::Skipped,
            });
        };

        let status = CandidateStatus::from(verdict);
        let now = time::now();
        let record = ReviewRecord {
            status,
            reviewed_at: now,
            reviewed_by: reviewer
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REVIEWER.to_string()),
        };

        let Some(updated) = self.store.apply_review(id, &record, &changes.fields).await? else {
            let latest = self
                .store
                .find_candidate(id)
                .await?
                .ok_or_else(candidate_not_found)?;
            let candidate = self.apply_fields_or_reload(latest, &changes.fields).await?;
            info!(
                candidate_id = %id,
                current = %candidate.status,
                requested = %status,
                "candidate already reviewed, status unchanged"
            );
            // Re-approving a candidate whose contact sync failed earlier
            // retries the enrollment. Once the sequence has started nothing
            // is re-run.
            let (candidate, contact_sync) = if status == CandidateStatus::Approved
                && current.status == CandidateStatus::Approved
                && candidate.status == CandidateStatus::Approved
                && candidate.email_sequence_started_at.is_none()
            {
                let contact_sync = self.enroll_if_approved(&candidate, now).await;
                let candidate = self.store.find_candidate(id).await?.unwrap_or(candidate);
                (candidate, contact_sync)
            } else {
                (candidate, SideEffect::Skipped)
            };
            return Ok(ReviewOutcome {
                transition: Transition::AlreadyReviewed(candidate.status),
                candidate: self.with_emails(candidate).await?,
                contact_sync,
                notification: SideEffect::Skipped,
            });
        };

        info!(candidate_id = %id, %status, reviewer = %record.reviewed_by, "candidate reviewed");

        let contact_sync = self.enroll_if_approved(&updated, now).await;

        let notification = match updated.bound_message() {
            Some((chat_id, message_id)) => {
                let banner = terse_status_banner(&updated, status);
                SideEffect::attempt(
                    "edit_message",
                    self.notifier.edit_message(chat_id, message_id, &banner).await,
                )
            }
            None => SideEffect::Skipped,
        };

        let candidate = self.store.find_candidate(id).await?.unwrap_or(updated);
        Ok(ReviewOutcome {
            candidate: self.with_emails(candidate).await?,
            transition: Transition::Applied(status),
            contact_sync,
            notification,
        })
    }

    /// Chat-button review. Never transitions a candidate that is no longer
    /// `PENDING`, so repeated deliveries of the same press are harmless.
    pub async fn handle_chat_action(&self, action: &ChatAction) -> Result<ChatActionOutcome> {
        let Some(candidate) = self.store.find_candidate(action.candidate_id).await? else {
            self.notify_chat(action.chat_id, NOT_FOUND_NOTICE).await;
            self.acknowledge(action, None).await;
            return Ok(ChatActionOutcome::NotFound);
        };

        if candidate.status.is_terminal() {
            return Ok(self.report_already_reviewed(action, candidate.status).await);
        }

        let status = CandidateStatus::from(action.verb.verdict());
        let now = time::now();
        let record = ReviewRecord {
            status,
            reviewed_at: now,
            reviewed_by: action.reviewer.reviewed_by(),
        };

        let Some(updated) = self
            .store
            .apply_review(candidate.id, &record, &FieldChanges::default())
            .await?
        else {
            // Lost the race against another reviewer.
            return match self.store.find_candidate(candidate.id).await? {
                Some(latest) => Ok(self.report_already_reviewed(action, latest.status).await),
                None => {
                    self.acknowledge(action, None).await;
                    Ok(ChatActionOutcome::NotFound)
                }
            };
        };

        info!(
            candidate_id = %updated.id,
            %status,
            reviewer = %record.reviewed_by,
            "candidate reviewed from chat"
        );

        let contact_sync = self.enroll_if_approved(&updated, now).await;

        let banner = status_banner(&updated, status, &action.reviewer.display_name());
        let notification = SideEffect::attempt(
            "edit_message",
            self.notifier
                .edit_message(action.chat_id, action.message_id, &banner)
                .await,
        );

        self.acknowledge(action, Some(callback_answer(status))).await;

        Ok(ChatActionOutcome::Resolved {
            status,
            contact_sync,
            notification,
        })
    }

    /// Syncs an approved candidate to the contact list and materializes the
    /// email sequence. The sequence is only started once the sync succeeded.
    async fn enroll_if_approved(&self, candidate: &Candidate, started_at: DateTime<Utc>) -> SideEffect {
        if candidate.status != CandidateStatus::Approved {
            return SideEffect::Skipped;
        }

        let contact = ContactUpsert::from_candidate(candidate);
        let receipt = match self.contacts.upsert_contact(&contact).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    candidate_id = %candidate.id,
                    error = %e,
                    "contact sync failed, email sequence not started"
                );
                return SideEffect::Failed(e.to_string());
            }
        };

        let drafts = plan_sequence(DEFAULT_SEQUENCE, started_at);
        match self
            .store
            .start_email_sequence(candidate.id, receipt.contact_id.as_deref(), started_at, &drafts)
            .await
        {
            Ok(inserted) => {
                info!(
                    candidate_id = %candidate.id,
                    contact_id = ?receipt.contact_id,
                    inserted,
                    "email sequence started"
                );
                SideEffect::Applied
            }
            Err(e) => SideEffect::attempt::<u64, _>("start_email_sequence", Err(e)),
        }
    }

    async fn report_already_reviewed(
        &self,
        action: &ChatAction,
        status: CandidateStatus,
    ) -> ChatActionOutcome {
        info!(candidate_id = %action.candidate_id, %status, "chat action on reviewed candidate ignored");
        self.notify_chat(action.chat_id, &already_reviewed_notice(status)).await;
        self.acknowledge(action, None).await;
        ChatActionOutcome::AlreadyReviewed(status)
    }

    async fn notify_chat(&self, chat_id: i64, text: &str) {
        let _ = SideEffect::attempt(
            "send_notice",
            self.notifier.send_message(Some(chat_id), text, None).await,
        );
    }

    async fn acknowledge(&self, action: &ChatAction, text: Option<String>) {
        let _ = SideEffect::attempt(
            "answer_callback",
            self.notifier
                .answer_callback(&action.callback_query_id, text)
                .await,
        );
    }

    async fn apply_fields_or_reload(&self, current: Candidate, fields: &FieldChanges) -> Result<Candidate> {
        if fields.is_empty() {
            return Ok(current);
        }
        self.store
            .apply_field_changes(current.id, fields)
            .await?
            .ok_or_else(candidate_not_found)
    }

    async fn with_emails(&self, candidate: Candidate) -> Result<CandidateWithEmails> {
        let scheduled_emails = self.store.scheduled_emails(candidate.id).await?;
        Ok(CandidateWithEmails {
            candidate,
            scheduled_emails,
        })
    }
}
