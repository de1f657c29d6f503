use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use careers_backend::dto::application_dto::ApplyPayload;
use careers_backend::dto::job_dto::CreateJobPayload;
use careers_backend::dto::offer_dto::GenerateLetterPayload;
use careers_backend::dto::user_dto::CreateUserPayload;
use careers_backend::services::document_service::DocumentService;
use careers_backend::services::upload_service::UploadService;
use careers_backend::AppState;

async fn setup() -> AppState {
    careers_backend::config::init_config_for_tests();
    let pool = careers_backend::database::pool::connect("sqlite::memory:")
        .await
        .expect("pool");
    careers_backend::database::schema::init(&pool)
        .await
        .expect("schema");
    AppState::new(pool)
}

fn write_template(dir: &std::path::Path, name: &str, body: &str) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer
        .start_file("[Content_Types].xml", options)
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(dir.join(name), bytes).unwrap();
}

fn read_document_xml(path: &std::path::Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name("word/document.xml").unwrap();
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    out
}

async fn seed_application(state: &AppState) -> i64 {
    let recruiter = state
        .user_service
        .create(CreateUserPayload {
            name: "HR Lead".to_string(),
            email: "hr@example.com".to_string(),
            phone: None,
            city: None,
            role: Some("admin".to_string()),
            group_id: None,
            password: None,
        })
        .await
        .expect("recruiter");
    let job = state
        .job_service
        .create(
            CreateJobPayload {
                title: "Staff Nurse".to_string(),
                department: Some("ICU".to_string()),
                location: Some("Chennai".to_string()),
                employment_type: None,
                salary_min: None,
                salary_max: None,
                description: None,
                qualifications: None,
                experience_level: None,
                status: Some("active".to_string()),
            },
            recruiter.id,
        )
        .await
        .expect("job");
    let application = state
        .application_service
        .apply(
            ApplyPayload {
                job_id: job.id,
                name: "Jane Doe".to_string(),
                email: "jane.letters@example.com".to_string(),
                phone: None,
                city: None,
                linkedin_url: None,
                github_url: None,
                portfolio_url: None,
                experience: vec![],
                education: vec![],
            },
            None,
        )
        .await
        .expect("apply");
    application.id
}

#[tokio::test]
async fn offer_letter_fills_tags_and_moves_status() {
    let state = setup().await;
    let application_id = seed_application(&state).await;

    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    write_template(
        &templates,
        "full_time.docx",
        "<w:t>Dear {NAME}, we offer you {POSITION} in {DEPARTMENT} at {salary}.</w:t>",
    );
    let uploads = UploadService::new(dir.path().join("uploads"));
    let documents = DocumentService::new(state.pool.clone(), uploads.clone(), &templates);

    let mut fields = HashMap::new();
    fields.insert("SALARY".to_string(), "INR 75,000".to_string());
    let (stored, appointment) = documents
        .generate(GenerateLetterPayload {
            application_id,
            template: "full_time".to_string(),
            fields,
        })
        .await
        .expect("generate");
    assert!(!appointment);

    let rendered = read_document_xml(&uploads.absolute_path(&stored.relative_path));
    assert_eq!(
        rendered,
        "<w:t>Dear Jane Doe, we offer you Staff Nurse in ICU at INR 75,000.</w:t>"
    );

    let application = state
        .application_service
        .attach_letter(application_id, appointment, &stored.url, None)
        .await
        .expect("attach");
    assert_eq!(application.status, "offered");
    assert_eq!(application.offer_letter_url.as_deref(), Some(stored.url.as_str()));
}

#[tokio::test]
async fn appointment_letter_leaves_status_alone() {
    let state = setup().await;
    let application_id = seed_application(&state).await;

    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    write_template(&templates, "full_time.docx", "<w:t>Offer {NAME}</w:t>");
    write_template(&templates, "appointment.docx", "<w:t>Appointment {NAME}</w:t>");
    let uploads = UploadService::new(dir.path().join("uploads"));
    let documents = DocumentService::new(state.pool.clone(), uploads, &templates);

    let (offer, appointment) = documents
        .generate(GenerateLetterPayload {
            application_id,
            template: "full_time".to_string(),
            fields: HashMap::new(),
        })
        .await
        .unwrap();
    assert!(!appointment);
    state
        .application_service
        .attach_letter(application_id, appointment, &offer.url, None)
        .await
        .unwrap();

    let (letter, appointment) = documents
        .generate(GenerateLetterPayload {
            application_id,
            template: "appointment".to_string(),
            fields: HashMap::new(),
        })
        .await
        .unwrap();
    assert!(appointment);
    let application = state
        .application_service
        .attach_letter(application_id, appointment, &letter.url, None)
        .await
        .unwrap();

    assert_eq!(application.status, "offered");
    assert!(application.appointment_letter_url.is_some());
    assert!(application.offer_letter_url.is_some());
}

#[tokio::test]
async fn uploaded_letter_bypasses_templating() {
    let state = setup().await;
    let application_id = seed_application(&state).await;

    let dir = tempfile::tempdir().unwrap();
    let uploads = UploadService::new(dir.path().join("uploads"));
    let stored = uploads
        .store(
            "letters",
            "signed_offer.docx",
            bytes::Bytes::from_static(b"raw letter bytes"),
        )
        .await
        .unwrap();

    // The file lands on disk untouched; no merge fields, no re-zipping.
    let on_disk = std::fs::read(uploads.absolute_path(&stored.relative_path)).unwrap();
    assert_eq!(on_disk, b"raw letter bytes");

    let application = state
        .application_service
        .attach_letter(application_id, false, &stored.url, None)
        .await
        .unwrap();
    assert_eq!(application.status, "offered");
    assert_eq!(application.offer_letter_url.as_deref(), Some(stored.url.as_str()));
}

#[tokio::test]
async fn unknown_template_is_not_found() {
    let state = setup().await;
    let application_id = seed_application(&state).await;

    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    let uploads = UploadService::new(dir.path().join("uploads"));
    let documents = DocumentService::new(state.pool.clone(), uploads, &templates);

    let err = documents
        .generate(GenerateLetterPayload {
            application_id,
            template: "locum".to_string(),
            fields: HashMap::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, careers_backend::error::Error::NotFound(_)));

    let err = documents
        .generate(GenerateLetterPayload {
            application_id,
            template: "../etc/passwd".to_string(),
            fields: HashMap::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, careers_backend::error::Error::BadRequest(_)));
}
