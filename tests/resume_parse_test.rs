use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use careers_backend::services::resume_service::{extract_text, ResumeService};

const SAMPLE_TEXT: &str = "Priya Sharma\nStaff Nurse, ICU\npriya.sharma@example.com\n+91 90000 11111\nlinkedin.com/in/priyasharma\n";

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document><w:body>"#,
    );
    for p in paragraphs {
        body.push_str(&format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p));
    }
    body.push_str("</w:body></w:document>");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn docx_text_extraction_joins_paragraphs() {
    let docx = docx_with_paragraphs(&["Priya Sharma", "Staff Nurse", "priya@example.com"]);
    let text = extract_text(&docx, "resume.docx").unwrap();
    assert_eq!(text, "Priya Sharma\nStaff Nurse\npriya@example.com");
}

#[test]
fn runs_of_text_within_one_paragraph_concatenate() {
    let body = r#"<w:document><w:body><w:p><w:r><w:t>Priya </w:t></w:r><w:r><w:t>Sharma</w:t></w:r></w:p></w:body></w:document>"#;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    let docx = writer.finish().unwrap().into_inner();

    let text = extract_text(&docx, "cv.docx").unwrap();
    assert!(text.contains("Sharma"));
}

#[test]
fn garbage_docx_is_a_bad_request() {
    let err = extract_text(b"definitely not a zip", "resume.docx").unwrap_err();
    assert!(matches!(err, careers_backend::error::Error::BadRequest(_)));
}

#[tokio::test]
async fn parser_falls_back_to_regex_without_api_keys() {
    careers_backend::config::init_config_for_tests();
    let service = ResumeService::new(None, None, reqwest::Client::new());

    let profile = service
        .parse(SAMPLE_TEXT.as_bytes(), "resume.txt")
        .await
        .expect("parse");
    assert_eq!(profile.source, "regex");
    assert_eq!(profile.email.as_deref(), Some("priya.sharma@example.com"));
    assert_eq!(profile.name.as_deref(), Some("Priya Sharma"));
    assert_eq!(
        profile.linkedin_url.as_deref(),
        Some("linkedin.com/in/priyasharma")
    );
}

#[tokio::test]
async fn regex_fallback_works_on_docx_input_too() {
    careers_backend::config::init_config_for_tests();
    let service = ResumeService::new(None, None, reqwest::Client::new());

    let docx = docx_with_paragraphs(&["Priya Sharma", "priya.sharma@example.com"]);
    let profile = service.parse(&docx, "resume.docx").await.expect("parse");
    assert_eq!(profile.source, "regex");
    assert_eq!(profile.email.as_deref(), Some("priya.sharma@example.com"));
}

#[tokio::test]
async fn empty_input_is_rejected() {
    careers_backend::config::init_config_for_tests();
    let service = ResumeService::new(None, None, reqwest::Client::new());
    assert!(service.parse(b"   \n  ", "resume.txt").await.is_err());
}
