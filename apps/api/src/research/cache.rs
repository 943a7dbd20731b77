//! Persisted company research cache.
//!
//! A row is written once per company id and treated as authoritative
//! thereafter. There is no freshness check and no TTL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::research::CompanyResearchRow;

/// Cache seam used by the resolver. `Arc<dyn ResearchCache>` in state.
#[async_trait]
pub trait ResearchCache: Send + Sync {
    async fn find_by_company_id(&self, company_id: &str) -> Result<Option<CompanyResearchRow>>;

    /// Inserts a new research row. Concurrent resolutions of the same
    /// company may both attempt this; the duplicate insert is a no-op,
    /// not an error.
    async fn create(&self, row: &CompanyResearchRow) -> Result<()>;
}

pub struct PgResearchCache {
    pool: PgPool,
}

impl PgResearchCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResearchCache for PgResearchCache {
    async fn find_by_company_id(&self, company_id: &str) -> Result<Option<CompanyResearchRow>> {
        let row = sqlx::query_as::<_, CompanyResearchRow>(
            "SELECT * FROM company_research WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, row: &CompanyResearchRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO company_research
                (id, company_id, company_name, philosophy, career_path, talent_needs,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (company_id) DO NOTHING
            "#,
        )
        .bind(row.id)
        .bind(&row.company_id)
        .bind(&row.company_name)
        .bind(&row.philosophy)
        .bind(&row.career_path)
        .bind(&row.talent_needs)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
