//! Applicant profile persistence.
//!
//! One profile per applicant (`applicant_id` unique). The generation
//! pipeline reads through the same seam the HTTP handlers write through.

pub mod handlers;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::{ApplicantProfile, ProfileRow};

/// Profile seam. `Arc<dyn ProfileStore>` in state.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_by_applicant(&self, applicant_id: Uuid) -> Result<Option<ProfileRow>>;

    /// Inserts a profile. Returns `None` when the applicant already has one.
    async fn create(
        &self,
        applicant_id: Uuid,
        profile: &ApplicantProfile,
    ) -> Result<Option<ProfileRow>>;

    /// Replaces all four profile fields. Returns `None` when no profile
    /// exists for the applicant.
    async fn update(
        &self,
        applicant_id: Uuid,
        profile: &ApplicantProfile,
    ) -> Result<Option<ProfileRow>>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_by_applicant(&self, applicant_id: Uuid) -> Result<Option<ProfileRow>> {
        let row =
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE applicant_id = $1")
                .bind(applicant_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row)
    }

    async fn create(
        &self,
        applicant_id: Uuid,
        profile: &ApplicantProfile,
    ) -> Result<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (applicant_id, work, skills, self_pr, future_goals)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (applicant_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(applicant_id)
        .bind(&profile.work)
        .bind(&profile.skills)
        .bind(&profile.self_pr)
        .bind(&profile.future_goals)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(
        &self,
        applicant_id: Uuid,
        profile: &ApplicantProfile,
    ) -> Result<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET work = $2, skills = $3, self_pr = $4, future_goals = $5, updated_at = NOW()
            WHERE applicant_id = $1
            RETURNING *
            "#,
        )
        .bind(applicant_id)
        .bind(&profile.work)
        .bind(&profile.skills)
        .bind(&profile.self_pr)
        .bind(&profile.future_goals)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
