use chrono::{DateTime, Duration, Utc};

/// One step of an email sequence run by the external automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceStep {
    pub email_number: i32,
    pub template_id: i32,
    pub subject: &'static str,
    pub delay_hours: i64,
}

/// Approval sequence; must stay in sync with the Brevo automation templates.
pub const DEFAULT_SEQUENCE: &[SequenceStep] = &[
    SequenceStep {
        email_number: 1,
        template_id: 3,
        subject: "Твоят кастинг номер е генериран",
        delay_hours: 0,
    },
    SequenceStep {
        email_number: 2,
        template_id: 4,
        subject: "Кой всъщност ще те обучава?",
        delay_hours: 24,
    },
    SequenceStep {
        email_number: 3,
        template_id: 5,
        subject: "Поемам целия риск вместо теб",
        delay_hours: 72,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEmailDraft {
    pub email_number: i32,
    pub template_id: i32,
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Computes fire times for every step relative to `started_at`. Delays are
/// plain wall-clock hours.
pub fn plan_sequence(steps: &[SequenceStep], started_at: DateTime<Utc>) -> Vec<ScheduledEmailDraft> {
    steps
        .iter()
        .map(|step| ScheduledEmailDraft {
            email_number: step.email_number,
            template_id: step.template_id,
            subject: step.subject.to_string(),
            scheduled_for: started_at + Duration::hours(step.delay_hours),
        })
        .collect()
}
