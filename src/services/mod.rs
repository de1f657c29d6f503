pub mod application_service;
pub mod content_service;
pub mod document_service;
pub mod export_service;
pub mod job_service;
pub mod message_service;
pub mod notification_service;
pub mod resume_service;
pub mod scoring;
pub mod upload_service;
pub mod user_group_service;
pub mod user_service;
