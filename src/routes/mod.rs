pub mod applications;
pub mod auth;
pub mod content;
pub mod export;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod offers;
pub mod resume;
pub mod user_groups;
pub mod users;
