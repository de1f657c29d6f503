use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: i64,
    pub job_id: i64,
    pub user_id: i64,
    pub status: String,
    pub score: f64,
    pub resume_path: Option<String>,
    pub offer_letter_url: Option<String>,
    pub appointment_letter_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationEvent {
    pub id: i64,
    pub application_id: i64,
    pub actor_id: Option<i64>,
    pub from_status: Option<String>,
    pub to_status: String,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewPanelist {
    pub id: i64,
    pub application_id: i64,
    pub user_id: i64,
    pub panel_role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Lifecycle of one (job, candidate) pair. The pipeline is strictly
/// forward; `Rejected` and `Withdrawn` absorb from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    New,
    Reviewed,
    Interview,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Some(ApplicationStatus::New),
            "reviewed" => Some(ApplicationStatus::Reviewed),
            "interview" => Some(ApplicationStatus::Interview),
            "offered" => Some(ApplicationStatus::Offered),
            "hired" => Some(ApplicationStatus::Hired),
            "rejected" => Some(ApplicationStatus::Rejected),
            "withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    fn rank(&self) -> u8 {
        match self {
            ApplicationStatus::New => 0,
            ApplicationStatus::Reviewed => 1,
            ApplicationStatus::Interview => 2,
            ApplicationStatus::Offered => 3,
            ApplicationStatus::Hired => 4,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn => u8::MAX,
        }
    }

    pub fn can_transition_to(&self, to: ApplicationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn => true,
            ApplicationStatus::New => false,
            _ => to.rank() > self.rank(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus;
    use super::ApplicationStatus::*;

    #[test]
    fn forward_moves_are_allowed() {
        assert!(New.can_transition_to(Reviewed));
        assert!(New.can_transition_to(Interview));
        assert!(Reviewed.can_transition_to(Interview));
        assert!(Interview.can_transition_to(Offered));
        assert!(Offered.can_transition_to(Hired));
    }

    #[test]
    fn backward_moves_are_rejected() {
        assert!(!Reviewed.can_transition_to(New));
        assert!(!Interview.can_transition_to(Reviewed));
        assert!(!Offered.can_transition_to(Interview));
        assert!(!Hired.can_transition_to(Offered));
    }

    #[test]
    fn rejection_and_withdrawal_absorb_from_anywhere() {
        for from in [New, Reviewed, Interview, Offered] {
            assert!(from.can_transition_to(Rejected));
            assert!(from.can_transition_to(Withdrawn));
        }
    }

    #[test]
    fn terminal_states_are_absorbing() {
        for from in [Hired, Rejected, Withdrawn] {
            for to in [New, Reviewed, Interview, Offered, Hired, Rejected, Withdrawn] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn round_trips_through_strings() {
        for status in [New, Reviewed, Interview, Offered, Hired, Rejected, Withdrawn] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("bogus"), None);
    }
}
