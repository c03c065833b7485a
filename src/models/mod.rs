pub mod candidate;
pub mod review;
pub mod scheduled_email;
pub mod tag;
