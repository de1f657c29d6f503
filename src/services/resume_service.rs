use std::io::{Cursor, Read};
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::dto::resume_dto::ResumeProfile;
use crate::error::{Error, Result};

/// Résumé extraction: format-specific text extraction, then a provider
/// fallback chain (OpenAI, then Gemini, then regex-only) that always
/// produces the same JSON shape.
#[derive(Clone)]
pub struct ResumeService {
    client: Client,
    openai_api_key: Option<String>,
    gemini_api_key: Option<String>,
}

const EXTRACTION_PROMPT: &str = r#"Extract structured information from this resume.
Return a JSON object with exactly these fields (null where unknown):
{
  "name": "Full name",
  "email": "Email address",
  "phone": "Phone number",
  "location": "City or address",
  "linkedin_url": "LinkedIn profile URL",
  "github_url": "GitHub profile URL",
  "portfolio_url": "Personal website URL",
  "summary": "2-3 sentence professional summary",
  "skills": ["skill", ...],
  "experience": [
    {"title": "Job title", "company": "Company", "start_date": "YYYY-MM",
     "end_date": "YYYY-MM or null", "is_current": false, "description": "..."}
  ],
  "education": [
    {"degree": "Degree", "field_of_study": "Field", "institution": "School",
     "start_year": 2015, "end_year": 2019}
  ]
}

Resume text:
"#;

impl ResumeService {
    pub fn new(
        openai_api_key: Option<String>,
        gemini_api_key: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            client,
            openai_api_key,
            gemini_api_key,
        }
    }

    pub async fn parse(&self, bytes: &[u8], filename: &str) -> Result<ResumeProfile> {
        let text = extract_text(bytes, filename)?;
        if text.trim().is_empty() {
            return Err(Error::BadRequest(
                "could not extract any text from the uploaded file".to_string(),
            ));
        }

        if let Some(key) = &self.openai_api_key {
            match self.parse_with_openai(key, &text).await {
                Ok(mut profile) => {
                    profile.source = "openai".to_string();
                    return Ok(profile);
                }
                Err(e) => warn!(error = ?e, "openai extraction failed, trying gemini"),
            }
        }
        if let Some(key) = &self.gemini_api_key {
            match self.parse_with_gemini(key, &text).await {
                Ok(mut profile) => {
                    profile.source = "gemini".to_string();
                    return Ok(profile);
                }
                Err(e) => warn!(error = ?e, "gemini extraction failed, using regex fallback"),
            }
        }

        let mut profile = regex_extract(&text);
        profile.source = "regex".to_string();
        Ok(profile)
    }

    async fn parse_with_openai(&self, api_key: &str, text: &str) -> Result<ResumeProfile> {
        let payload = json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You extract structured data from resumes. Respond with JSON only."},
                {"role": "user", "content": format!("{}{}", EXTRACTION_PROMPT, text)}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.0
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let body: JsonValue = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::Internal("openai response missing content".to_string()))?;
        profile_from_model_output(content)
    }

    async fn parse_with_gemini(&self, api_key: &str, text: &str) -> Result<ResumeProfile> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key={}",
            api_key
        );
        let payload = json!({
            "contents": [{
                "parts": [{ "text": format!("{}{}", EXTRACTION_PROMPT, text) }]
            }],
            "generationConfig": { "temperature": 0.0 }
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let body: JsonValue = response.json().await?;
        let content = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| Error::Internal("gemini response missing content".to_string()))?;
        profile_from_model_output(content)
    }
}

/// Parse model output, salvaging a JSON object out of markdown fences if
/// needed, and insist on at least a name or an email before trusting it.
fn profile_from_model_output(content: &str) -> Result<ResumeProfile> {
    let parsed: ResumeProfile = serde_json::from_str(content).or_else(|_| {
        let start = content.find('{');
        let end = content.rfind('}');
        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str(&content[start..=end]).map_err(Error::from)
            }
            _ => Err(Error::Internal("no JSON object in model output".to_string())),
        }
    })?;
    if parsed.name.is_none() && parsed.email.is_none() {
        return Err(Error::Internal(
            "model output missing both name and email".to_string(),
        ));
    }
    Ok(parsed)
}

pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::BadRequest(format!("could not read PDF: {}", e)))
    } else if lower.ends_with(".docx") {
        extract_docx_text(bytes)
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn extract_docx_text(data: &[u8]) -> Result<String> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| Error::BadRequest(format!("could not read DOCX: {}", e)))?;

    let mut document_file = archive
        .by_name("word/document.xml")
        .map_err(|e| Error::BadRequest(format!("DOCX has no document body: {}", e)))?;
    let mut xml = String::new();
    document_file.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut lines = Vec::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:p" {
                    in_paragraph = true;
                    current.clear();
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"w:p" {
                    if !current.trim().is_empty() {
                        lines.push(current.trim().to_string());
                    }
                    current.clear();
                    in_paragraph = false;
                }
            }
            Ok(Event::Text(e)) => {
                if in_paragraph {
                    let value = e
                        .xml_content()
                        .map_err(|err| Error::BadRequest(format!("bad DOCX text: {}", err)))?
                        .into_owned();
                    current.push_str(&value);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(Error::BadRequest(format!("bad DOCX xml: {}", err))),
            _ => {}
        }

        buf.clear();
    }

    Ok(lines.join("\n"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("phone regex")
    })
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:https?://)?(?:www\.)?(linkedin\.com/in/[\w-]+|github\.com/[\w-]+)")
            .expect("link regex")
    })
}

/// Last-resort extraction when no provider is reachable: email, phone and
/// profile links only, plus the first line as a name guess.
fn regex_extract(text: &str) -> ResumeProfile {
    let mut profile = ResumeProfile::default();

    profile.email = email_re().find(text).map(|m| m.as_str().to_string());
    profile.phone = phone_re().find(text).map(|m| m.as_str().trim().to_string());
    for m in link_re().find_iter(text) {
        let link = m.as_str().to_string();
        if link.contains("linkedin.com") && profile.linkedin_url.is_none() {
            profile.linkedin_url = Some(link);
        } else if link.contains("github.com") && profile.github_url.is_none() {
            profile.github_url = Some(link);
        }
    }
    profile.name = text
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty() && !line.contains('@') && line.split_whitespace().count() <= 5
        })
        .map(|line| line.to_string());

    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe\nSenior Staff Nurse\njane.doe@example.com\n+91 98765 43210\nlinkedin.com/in/janedoe\ngithub.com/janedoe\n";

    #[test]
    fn regex_fallback_finds_contact_fields() {
        let profile = regex_extract(SAMPLE);
        assert_eq!(profile.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(profile.phone.as_deref(), Some("+91 98765 43210"));
        assert_eq!(profile.linkedin_url.as_deref(), Some("linkedin.com/in/janedoe"));
        assert_eq!(profile.github_url.as_deref(), Some("github.com/janedoe"));
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn model_output_salvages_fenced_json() {
        let fenced = "```json\n{\"name\": \"Jane Doe\", \"email\": \"jane@example.com\"}\n```";
        let profile = profile_from_model_output(fenced).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn model_output_without_identity_is_rejected() {
        assert!(profile_from_model_output("{\"skills\": []}").is_err());
        assert!(profile_from_model_output("not json at all").is_err());
    }

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text(SAMPLE.as_bytes(), "resume.txt").unwrap();
        assert!(text.contains("Jane Doe"));
    }
}
