pub mod telegram_format;
pub mod time;
