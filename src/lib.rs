pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, content_service::ContentService,
    document_service::DocumentService, export_service::ExportService, job_service::JobService,
    message_service::MessageService, notification_service::NotificationService,
    resume_service::ResumeService, upload_service::UploadService,
    user_group_service::UserGroupService, user_service::UserService,
};
use reqwest::Client;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub job_service: JobService,
    pub user_service: UserService,
    pub user_group_service: UserGroupService,
    pub application_service: ApplicationService,
    pub notification_service: NotificationService,
    pub message_service: MessageService,
    pub content_service: ContentService,
    pub upload_service: UploadService,
    pub resume_service: ResumeService,
    pub document_service: DocumentService,
    pub export_service: ExportService,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let job_service = JobService::new(pool.clone());
        let user_service = UserService::new(pool.clone());
        let user_group_service = UserGroupService::new(pool.clone());
        let notification_service = NotificationService::new(pool.clone());
        let application_service =
            ApplicationService::new(pool.clone(), notification_service.clone());
        let message_service = MessageService::new(pool.clone());
        let content_service = ContentService::new(pool.clone());
        let upload_service = UploadService::new(config.uploads_dir.clone());
        let resume_service = ResumeService::new(
            config.openai_api_key.clone(),
            config.gemini_api_key.clone(),
            http_client,
        );
        let document_service = DocumentService::new(
            pool.clone(),
            upload_service.clone(),
            config.templates_dir.clone(),
        );
        let export_service = ExportService::new(pool.clone());

        Self {
            pool,
            job_service,
            user_service,
            user_group_service,
            application_service,
            notification_service,
            message_service,
            content_service,
            upload_service,
            resume_service,
            document_service,
            export_service,
        }
    }
}
