use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::scheduled_email::ScheduledEmail;

/// Review state of a candidate. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Pending,
    Approved,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "PENDING",
            CandidateStatus::Approved => "APPROVED",
            CandidateStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CandidateStatus::Pending)
    }

    /// Emoji and bold verdict label used in chat banners.
    pub fn banner(&self) -> (&'static str, &'static str) {
        match self {
            CandidateStatus::Pending => ("⏳", "ОЧАКВА ПРЕГЛЕД"),
            CandidateStatus::Approved => ("✅", "ОДОБРЕН"),
            CandidateStatus::Rejected => ("❌", "ОТХВЪРЛЕН"),
        }
    }

    /// Past participle for "this candidate was already ...".
    pub fn reviewed_as(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "в изчакване",
            CandidateStatus::Approved => "одобрен",
            CandidateStatus::Rejected => "отхвърлен",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; used by list filters.
impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(CandidateStatus::Pending),
            "APPROVED" => Ok(CandidateStatus::Approved),
            "REJECTED" => Ok(CandidateStatus::Rejected),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// A reviewer's decision. Only terminal states can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(Verdict::Approved),
            "REJECTED" => Ok(Verdict::Rejected),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

impl From<Verdict> for CandidateStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Approved => CandidateStatus::Approved,
            Verdict::Rejected => CandidateStatus::Rejected,
        }
    }
}

/// Sales funnel position, independent of review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sales_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SalesStage {
    Contacted,
    PresentationScheduled,
    PresentationDone,
    ContractSent,
    Signed,
}

impl FromStr for SalesStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contacted" => Ok(SalesStage::Contacted),
            "presentation_scheduled" => Ok(SalesStage::PresentationScheduled),
            "presentation_done" => Ok(SalesStage::PresentationDone),
            "contract_sent" => Ok(SalesStage::ContractSent),
            "signed" => Ok(SalesStage::Signed),
            other => Err(format!("Invalid sales stage: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<i32>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub photo_urls: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub status: CandidateStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub brevo_contact_id: Option<String>,
    pub email_sequence_started_at: Option<DateTime<Utc>>,
    pub telegram_message_id: Option<i64>,
    pub telegram_chat_id: Option<i64>,
    pub sales_stage: Option<SalesStage>,
    pub sales_notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Chat coordinates of the intake notification, when one was sent.
    pub fn bound_message(&self) -> Option<(i64, i64)> {
        match (self.telegram_chat_id, self.telegram_message_id) {
            (Some(chat_id), Some(message_id)) => Some((chat_id, message_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateWithEmails {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub scheduled_emails: Vec<ScheduledEmail>,
}

/// Intake payload after normalization.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<i32>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub photo_urls: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}
