//! Candidate fit scoring: a deterministic keyword-overlap heuristic over the
//! job text and the candidate's most recent experience and education rows.
//! Computed lazily on first read and cached on the application row; same
//! inputs always produce the same score.

use std::collections::HashSet;

use crate::models::job::Job;
use crate::models::profile::{CandidateEducation, CandidateExperience};

const STOPWORDS: &[&str] = &[
    "and", "are", "for", "from", "has", "have", "its", "not", "our", "per", "the", "their",
    "this", "that", "was", "were", "will", "with", "you", "your", "all", "any", "able",
    "etc", "who", "what", "when", "where", "must", "should", "would", "years", "year",
    "experience", "required", "preferred", "candidate", "candidates", "work", "working",
];

/// How many of the freshest child rows count towards the score. Older
/// history is noise for fit purposes.
const RECENT_EXPERIENCE: usize = 3;
const RECENT_EDUCATION: usize = 2;

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

fn coverage(job_terms: &HashSet<String>, candidate_terms: &HashSet<String>) -> f64 {
    if job_terms.is_empty() {
        return 0.0;
    }
    let hits = job_terms.intersection(candidate_terms).count();
    hits as f64 / job_terms.len() as f64
}

/// Score in 0–100. Qualification overlap dominates, then the job title,
/// then the free-text description; a flat bonus when the advertised
/// experience level shows up in the candidate's own titles.
pub fn fit_score(
    job: &Job,
    experience: &[CandidateExperience],
    education: &[CandidateEducation],
) -> f64 {
    let mut candidate_text = String::new();
    for exp in experience.iter().take(RECENT_EXPERIENCE) {
        candidate_text.push_str(&exp.title);
        candidate_text.push(' ');
        if let Some(company) = &exp.company {
            candidate_text.push_str(company);
            candidate_text.push(' ');
        }
        if let Some(desc) = &exp.description {
            candidate_text.push_str(desc);
            candidate_text.push(' ');
        }
    }
    for edu in education.iter().take(RECENT_EDUCATION) {
        candidate_text.push_str(&edu.degree);
        candidate_text.push(' ');
        if let Some(field) = &edu.field_of_study {
            candidate_text.push_str(field);
            candidate_text.push(' ');
        }
    }
    let candidate_terms = tokenize(&candidate_text);
    if candidate_terms.is_empty() {
        return 0.0;
    }

    let title_terms = tokenize(&job.title);
    let qualification_terms = tokenize(job.qualifications.as_deref().unwrap_or(""));
    let description_terms = tokenize(job.description.as_deref().unwrap_or(""));

    let mut score = coverage(&qualification_terms, &candidate_terms) * 45.0
        + coverage(&title_terms, &candidate_terms) * 30.0
        + coverage(&description_terms, &candidate_terms) * 15.0;

    if let Some(level) = &job.experience_level {
        let level_terms = tokenize(level);
        let own_titles = tokenize(
            &experience
                .iter()
                .take(RECENT_EXPERIENCE)
                .map(|e| e.title.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );
        if !level_terms.is_empty() && !level_terms.is_disjoint(&own_titles) {
            score += 10.0;
        }
    }

    (score * 10.0).round() / 10.0
}
