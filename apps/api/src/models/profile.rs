use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted applicant profile row — one per applicant (`applicant_id` unique).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub work: String,
    pub skills: String,
    pub self_pr: String,
    pub future_goals: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The background an answer prompt draws on. Read-only during a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub work: String,
    pub skills: String,
    pub self_pr: String,
    pub future_goals: String,
}

impl From<ProfileRow> for ApplicantProfile {
    fn from(row: ProfileRow) -> Self {
        ApplicantProfile {
            work: row.work,
            skills: row.skills,
            self_pr: row.self_pr,
            future_goals: row.future_goals,
        }
    }
}
