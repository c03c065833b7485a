pub mod brevo_service;
pub mod email_sequence;
pub mod intake_service;
pub mod outcome;
pub mod review_service;
pub mod telegram_service;
