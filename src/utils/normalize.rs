//! String normalization for spreadsheet-style bulk import. Exported rows
//! arrive with inconsistent casing, stray whitespace and decorated phone
//! numbers; everything funnels through here before hitting the database.

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn clean_text(raw: &str) -> String {
    whitespace_re().replace_all(raw.trim(), " ").into_owned()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Keep digits and a leading '+'; drops separators, parentheses and
/// extension noise.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && i == 0 {
            out.push(c);
        }
    }
    out
}

/// Canonical snake_case form of a spreadsheet column header.
pub fn canonical_header(raw: &str) -> String {
    clean_text(raw)
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Treat empty and placeholder cells as absent.
pub fn non_empty(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(cleaned)
    }
}
