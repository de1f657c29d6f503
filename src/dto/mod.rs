pub mod application_dto;
pub mod auth_dto;
pub mod content_dto;
pub mod job_dto;
pub mod message_dto;
pub mod offer_dto;
pub mod resume_dto;
pub mod user_dto;
pub mod user_group_dto;
