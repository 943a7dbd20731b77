use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the tables the service writes to, if they do not exist yet.
///
/// `company_research.company_id` and `profiles.applicant_id` carry the
/// unique constraints the upsert paths conflict against.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS company_research (
            id UUID PRIMARY KEY,
            company_id TEXT NOT NULL UNIQUE,
            company_name TEXT NOT NULL,
            philosophy TEXT NOT NULL DEFAULT '',
            career_path TEXT NOT NULL DEFAULT '',
            talent_needs TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            applicant_id UUID NOT NULL UNIQUE,
            work TEXT NOT NULL DEFAULT '',
            skills TEXT NOT NULL DEFAULT '',
            self_pr TEXT NOT NULL DEFAULT '',
            future_goals TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ensured");
    Ok(())
}
