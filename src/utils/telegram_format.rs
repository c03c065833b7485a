//! Chat texts. The layouts are matched by reviewers' existing chat history,
//! so blank lines for missing fields are intentional.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::models::candidate::{Candidate, CandidateStatus};
use crate::services::telegram_service::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const NOT_FOUND_NOTICE: &str = "❌ Кандидатът не е намерен.";

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn line(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Whole years between `birth_date` and `today`.
pub fn calculate_age(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Alert posted to the admin chat when a new application arrives.
pub fn intake_message(candidate: &Candidate, today: NaiveDate) -> String {
    let birth = candidate.birth_date.map(|date| {
        let age = calculate_age(date, today);
        let age_text = if age != 0 {
            format!(" ({} години)", age)
        } else {
            String::new()
        };
        format!("🎂 {}{}", date.format("%Y-%m-%d"), age_text)
    });

    let text = format!(
        "📸 <b>Нова кандидатура за модел</b>\n\
         \n\
         👤 <b>{first} {last}</b>\n\
         📧 {email}\n\
         {phone}\n\
         {birth}\n\
         {height}\n\
         {city}\n\
         \n\
         {category}\n\
         \n\
         {instagram}\n\
         {tiktok}",
        first = candidate.first_name,
        last = candidate.last_name,
        email = candidate.email,
        phone = line(present(&candidate.phone).map(|p| format!("📱 {}", p))),
        birth = line(birth),
        height = line(
            candidate
                .height_cm
                .filter(|h| *h != 0)
                .map(|h| format!("📏 {} см", h))
        ),
        city = line(present(&candidate.city).map(|c| format!("📍 {}", c))),
        category = line(present(&candidate.category).map(|c| format!("📂 Категории: {}", c))),
        instagram = line(
            present(&candidate.instagram).map(|url| format!("🔗 <a href=\"{}\">Instagram</a>", url))
        ),
        tiktok = line(present(&candidate.tiktok).map(|url| format!("🔗 <a href=\"{}\">TikTok</a>", url))),
    );
    text.trim().to_string()
}

/// Approve/reject buttons; callback data is `verb:candidateId`.
pub fn review_keyboard(candidate_id: Uuid) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "✅ Одобри".to_string(),
                callback_data: format!("approve:{}", candidate_id),
            },
            InlineKeyboardButton {
                text: "❌ Отхвърли".to_string(),
                callback_data: format!("reject:{}", candidate_id),
            },
        ]],
    }
}

/// Verdict banner written over the intake alert after a chat-button review.
pub fn status_banner(candidate: &Candidate, status: CandidateStatus, reviewer: &str) -> String {
    let (emoji, label) = status.banner();
    format!(
        "{emoji} <b>{label}</b> от {reviewer}\n\
         \n\
         👤 {name}\n\
         📧 {email}\n\
         {phone}\n\
         {city}\n\
         {category}",
        name = candidate.full_name(),
        email = candidate.email,
        phone = line(present(&candidate.phone).map(|p| format!("📱 {}", p))),
        city = line(present(&candidate.city).map(|c| format!("📍 {}", c))),
        category = line(present(&candidate.category).map(|c| format!("📂 {}", c))),
    )
}

/// Short banner used when the verdict comes from the dashboard.
pub fn terse_status_banner(candidate: &Candidate, status: CandidateStatus) -> String {
    let (emoji, label) = status.banner();
    format!(
        "{} <b>{}</b>\n\n👤 {}\n📧 {}",
        emoji,
        label,
        candidate.full_name(),
        candidate.email
    )
}

pub fn already_reviewed_notice(status: CandidateStatus) -> String {
    format!("ℹ️ Този кандидат вече е бил {}.", status.reviewed_as())
}

pub fn callback_answer(status: CandidateStatus) -> String {
    match status {
        CandidateStatus::Approved => "Кандидатът е одобрен!".to_string(),
        CandidateStatus::Rejected => "Кандидатът е отхвърлен.".to_string(),
        CandidateStatus::Pending => "Кандидатът очаква преглед.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate() -> Candidate {
        Candidate {
            id: Uuid::nil(),
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            email: "ivan@example.com".into(),
            phone: Some("+359888123456".into()),
            birth_date: NaiveDate::from_ymd_opt(2000, 6, 15),
            height_cm: Some(182),
            instagram: Some("https://instagram.com/ivan".into()),
            tiktok: None,
            city: Some("Sofia".into()),
            category: None,
            photo_urls: vec![],
            submitted_at: Utc::now(),
            status: CandidateStatus::Pending,
            reviewed_at: None,
            reviewed_by: None,
            brevo_contact_id: None,
            email_sequence_started_at: None,
            telegram_message_id: None,
            telegram_chat_id: None,
            sales_stage: None,
            sales_notes: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn age_counts_whole_years() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(calculate_age(birth, NaiveDate::from_ymd_opt(2026, 6, 14).unwrap()), 25);
        assert_eq!(calculate_age(birth, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()), 26);
    }

    #[test]
    fn full_banner_keeps_blank_lines_for_missing_fields() {
        let text = status_banner(&candidate(), CandidateStatus::Approved, "maria");
        assert_eq!(
            text,
            "✅ <b>ОДОБРЕН</b> от maria\n\n👤 Ivan Petrov\n📧 ivan@example.com\n📱 +359888123456\n📍 Sofia\n"
        );
    }

    #[test]
    fn terse_banner_is_identity_only() {
        let text = terse_status_banner(&candidate(), CandidateStatus::Rejected);
        assert_eq!(text, "❌ <b>ОТХВЪРЛЕН</b>\n\n👤 Ivan Petrov\n📧 ivan@example.com");
    }

    #[test]
    fn intake_message_lists_profile() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let text = intake_message(&candidate(), today);
        assert!(text.starts_with("📸 <b>Нова кандидатура за модел</b>\n\n👤 <b>Ivan Petrov</b>"));
        assert!(text.contains("🎂 2000-06-15 (26 години)"));
        assert!(text.contains("📏 182 см"));
        assert!(text.contains("📍 Sofia\n\n\n\n🔗 <a href=\"https://instagram.com/ivan\">Instagram</a>"));
        assert!(!text.contains("TikTok"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn keyboard_encodes_verb_and_id() {
        let id = Uuid::new_v4();
        let keyboard = review_keyboard(id);
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data, format!("approve:{}", id));
        assert_eq!(keyboard.inline_keyboard[0][1].callback_data, format!("reject:{}", id));
    }

    #[test]
    fn notices_are_localized() {
        assert_eq!(
            already_reviewed_notice(CandidateStatus::Approved),
            "ℹ️ Този кандидат вече е бил одобрен."
        );
        assert_eq!(
            already_reviewed_notice(CandidateStatus::Rejected),
            "ℹ️ Този кандидат вече е бил отхвърлен."
        );
        assert_eq!(callback_answer(CandidateStatus::Approved), "Кандидатът е одобрен!");
    }
}
