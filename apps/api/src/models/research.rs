use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted company research row, keyed by `company_id` (unique).
/// Written once on first resolution and never updated — a hit is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyResearchRow {
    pub id: Uuid,
    pub company_id: String,
    pub company_name: String,
    pub philosophy: String,
    pub career_path: String,
    pub talent_needs: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated company background fed into answer prompts.
/// Any field may be empty when that facet could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub philosophy: String,
    pub career_path: String,
    pub talent_needs: String,
}

impl CompanyInfo {
    pub fn empty(name: &str) -> Self {
        CompanyInfo {
            name: name.to_string(),
            philosophy: String::new(),
            career_path: String::new(),
            talent_needs: String::new(),
        }
    }
}

impl From<CompanyResearchRow> for CompanyInfo {
    fn from(row: CompanyResearchRow) -> Self {
        CompanyInfo {
            name: row.company_name,
            philosophy: row.philosophy,
            career_path: row.career_path,
            talent_needs: row.talent_needs,
        }
    }
}
