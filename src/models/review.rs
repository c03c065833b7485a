use chrono::{DateTime, Utc};

use super::candidate::{CandidateStatus, SalesStage, Verdict};

pub const DEFAULT_REVIEWER: &str = "Admin";

/// Field updates that never affect review state. `None` leaves a field
/// untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    pub sales_stage: Option<Option<SalesStage>>,
    pub sales_notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.sales_stage.is_none() && self.sales_notes.is_none() && self.tags.is_none()
    }
}

/// A validated review request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewChanges {
    pub status: Option<Verdict>,
    pub fields: FieldChanges,
}

/// Review columns written together with a status transition.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub status: CandidateStatus,
    pub reviewed_at: DateTime<Utc>,
    pub reviewed_by: String,
}
