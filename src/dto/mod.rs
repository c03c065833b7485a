pub mod candidate_dto;
pub mod tag_dto;
pub mod telegram_dto;
