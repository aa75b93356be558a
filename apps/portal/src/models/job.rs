use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub category: String,
    pub experience_level: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub remote_type: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub posted_at: DateTime<Utc>,
}

/// Recruiter input for a new posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub category: String,
    pub experience_level: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub remote_type: String,
    pub description: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Reviewed,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    /// Rejected and accepted applications are closed.
    pub fn is_final(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Accepted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}
