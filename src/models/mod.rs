pub mod application;
pub mod content;
pub mod job;
pub mod message;
pub mod notification;
pub mod profile;
pub mod user;
pub mod user_group;
