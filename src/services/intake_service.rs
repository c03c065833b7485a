use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::{CandidateStore, InsertOutcome};
use crate::error::Result;
use crate::models::candidate::{Candidate, NewCandidate};
use crate::services::outcome::SideEffect;
use crate::services::telegram_service::Notifier;
use crate::utils::telegram_format::{intake_message, review_keyboard};
use crate::utils::time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Created { id: Uuid, notification: SideEffect },
    /// An application with this email already exists.
    Duplicate(Uuid),
}

#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn CandidateStore>,
    notifier: Arc<dyn Notifier>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn CandidateStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Stores a new application and, unless `silent`, posts it to the review
    /// chat with approve/reject buttons.
    pub async fn submit(&self, candidate: NewCandidate, silent: bool) -> Result<IntakeOutcome> {
        let email = candidate.email.clone();
        let created = match self.store.insert_candidate(candidate).await? {
            InsertOutcome::Created(created) => created,
            InsertOutcome::Existing(id) => {
                info!(candidate_id = %id, %email, "duplicate application ignored");
                return Ok(IntakeOutcome::Duplicate(id));
            }
        };
        info!(candidate_id = %created.id, %email, silent, "candidate application stored");

        let notification = if silent {
            SideEffect::Skipped
        } else {
            self.announce(&created).await
        };

        Ok(IntakeOutcome::Created {
            id: created.id,
            notification,
        })
    }

    async fn announce(&self, candidate: &Candidate) -> SideEffect {
        let text = intake_message(candidate, time::now().date_naive());
        let sent = match self
            .notifier
            .send_message(None, &text, Some(review_keyboard(candidate.id)))
            .await
        {
            Ok(sent) => sent,
            Err(e) => return SideEffect::attempt::<(), _>("send_intake_alert", Err(e)),
        };

        SideEffect::attempt(
            "bind_telegram_message",
            self.store
                .bind_telegram_message(candidate.id, sent.chat_id, sent.message_id)
                .await,
        )
    }
}
