use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::dto::offer_dto::GenerateLetterPayload;
use crate::error::{Error, Result};
use crate::models::application::JobApplication;
use crate::models::job::Job;
use crate::models::user::User;
use crate::services::upload_service::{StoredFile, UploadService};

const DOCUMENT_XML: &str = "word/document.xml";

/// Fills `{TAG}` placeholders in a DOCX template and stores the result as
/// a downloadable letter. Templates are plain Word documents kept in the
/// templates directory, one per letter variant.
#[derive(Clone)]
pub struct DocumentService {
    pool: SqlitePool,
    uploads: UploadService,
    templates_dir: PathBuf,
}

impl DocumentService {
    pub fn new(pool: SqlitePool, uploads: UploadService, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            uploads,
            templates_dir: templates_dir.into(),
        }
    }

    /// Render the selected template for an application. Returns the stored
    /// letter and whether it was an appointment letter rather than an offer.
    pub async fn generate(&self, payload: GenerateLetterPayload) -> Result<(StoredFile, bool)> {
        let template = payload.template.to_lowercase();
        if !template
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_')
        {
            return Err(Error::BadRequest(format!(
                "unknown letter template: {}",
                payload.template
            )));
        }
        let appointment = template == "appointment";

        let template_path = self.templates_dir.join(format!("{}.docx", template));
        let template_bytes = tokio::fs::read(&template_path).await.map_err(|_| {
            Error::NotFound(format!("letter template {} is not installed", template))
        })?;

        let fields = self.merge_fields(payload.application_id, payload.fields).await?;
        let rendered = render_docx(&template_bytes, &fields)?;

        let file_name = format!("{}_{}.docx", template, payload.application_id);
        let stored = self
            .uploads
            .store("letters", &file_name, bytes::Bytes::from(rendered))
            .await?;
        info!(
            application_id = payload.application_id,
            template, "generated letter"
        );
        Ok((stored, appointment))
    }

    /// Default merge fields from the application, overridable per request.
    async fn merge_fields(
        &self,
        application_id: i64,
        overrides: HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        let application =
            sqlx::query_as::<_, JobApplication>("SELECT * FROM job_applications WHERE id = ?")
                .bind(application_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("application {} not found", application_id))
                })?;
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(application.user_id)
            .fetch_one(&self.pool)
            .await?;
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(application.job_id)
            .fetch_one(&self.pool)
            .await?;

        let mut fields = HashMap::new();
        fields.insert("name".to_string(), user.name.clone());
        fields.insert("email".to_string(), user.email.clone());
        fields.insert("position".to_string(), job.title.clone());
        fields.insert("department".to_string(), job.department.clone().unwrap_or_default());
        fields.insert("location".to_string(), job.location.clone().unwrap_or_default());
        fields.insert("date".to_string(), Utc::now().format("%d %B %Y").to_string());
        for (key, value) in overrides {
            fields.insert(key.to_lowercase(), value);
        }
        Ok(fields)
    }
}

/// Rewrite a DOCX archive with placeholders substituted in the document
/// body. Every other entry is copied through untouched.
pub(crate) fn render_docx(template: &[u8], fields: &HashMap<String, String>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|_| Error::BadRequest("letter template is not a valid DOCX file".to_string()))?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut saw_document = false;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        if name == DOCUMENT_XML {
            saw_document = true;
            let xml = String::from_utf8(bytes)
                .map_err(|_| Error::BadRequest("letter template body is not UTF-8".to_string()))?;
            bytes = substitute_tags(&xml, fields).into_bytes();
        }

        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }
    if !saw_document {
        return Err(Error::BadRequest(
            "letter template has no document body".to_string(),
        ));
    }

    Ok(writer.finish()?.into_inner())
}

/// Replace `{tag}` placeholders. Word authors are inconsistent about
/// casing, so each field matches its UPPER, lower and Capitalised forms.
pub(crate) fn substitute_tags(xml: &str, fields: &HashMap<String, String>) -> String {
    let mut out = xml.to_string();
    for (key, value) in fields {
        let escaped = xml_escape(value);
        for variant in tag_variants(key) {
            out = out.replace(&format!("{{{}}}", variant), &escaped);
        }
    }
    out
}

fn tag_variants(key: &str) -> Vec<String> {
    let lower = key.to_lowercase();
    let upper = key.to_uppercase();
    let mut chars = lower.chars();
    let capitalised = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    let mut variants = vec![upper, lower];
    if !variants.contains(&capitalised) {
        variants.push(capitalised);
    }
    variants
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal_docx(body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file(DOCUMENT_XML, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.start_file("word/styles.xml", options).unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_entry(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = String::new();
        entry.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn substitutes_every_case_variant() {
        let xml = "<w:t>Dear {NAME}, {name}, {Name}</w:t>";
        let out = substitute_tags(xml, &fields(&[("name", "Jane")]));
        assert_eq!(out, "<w:t>Dear Jane, Jane, Jane</w:t>");
    }

    #[test]
    fn escapes_values_for_xml() {
        let out = substitute_tags("<w:t>{dept}</w:t>", &fields(&[("dept", "A&E <ward>")]));
        assert_eq!(out, "<w:t>A&amp;E &lt;ward&gt;</w:t>");
    }

    #[test]
    fn unknown_tags_are_left_in_place() {
        let out = substitute_tags("<w:t>{SALARY}</w:t>", &fields(&[("name", "Jane")]));
        assert_eq!(out, "<w:t>{SALARY}</w:t>");
    }

    #[test]
    fn renders_document_body_and_keeps_other_entries() {
        let docx = minimal_docx("<w:t>Offer for {POSITION}</w:t>");
        let rendered = render_docx(&docx, &fields(&[("position", "Staff Nurse")])).unwrap();
        assert_eq!(
            read_entry(&rendered, DOCUMENT_XML),
            "<w:t>Offer for Staff Nurse</w:t>"
        );
        assert_eq!(read_entry(&rendered, "word/styles.xml"), "<w:styles/>");
    }

    #[test]
    fn rejects_archives_without_a_body() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(render_docx(&bytes, &HashMap::new()).is_err());
    }
}
