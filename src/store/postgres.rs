use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{GuidanceStore, StoreError};
use crate::{
    models::{GuidanceContent, GuidanceRecord, Nutrition},
    week::Week,
};

const COLUMNS: &str = "id, user_id, week, symptoms, activities, nutrition_recommendations, \
     nutrition_food_to_avoid, nutrition_supplements, exercises, precautions, medical_tips, \
     created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

fn select(filter: &str) -> String {
    format!("SELECT {COLUMNS} FROM guidance WHERE {filter}")
}

#[derive(sqlx::FromRow)]
struct GuidanceRow {
    id: Uuid,
    user_id: Uuid,
    week: i16,
    symptoms: Vec<String>,
    activities: Vec<String>,
    nutrition_recommendations: Vec<String>,
    nutrition_food_to_avoid: Vec<String>,
    nutrition_supplements: Vec<String>,
    exercises: Vec<String>,
    precautions: Vec<String>,
    medical_tips: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GuidanceRow> for GuidanceRecord {
    type Error = StoreError;

    fn try_from(row: GuidanceRow) -> Result<Self, Self::Error> {
        let week = Week::new(i64::from(row.week)).map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(GuidanceRecord {
            id: row.id,
            user_id: row.user_id,
            week,
            content: GuidanceContent {
                symptoms: row.symptoms,
                activities: row.activities,
                nutrition: Nutrition {
                    recommendations: row.nutrition_recommendations,
                    food_to_avoid: row.nutrition_food_to_avoid,
                    supplements: row.nutrition_supplements,
                },
                exercises: row.exercises,
                precautions: row.precautions,
                medical_tips: row.medical_tips,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed store. `UNIQUE (user_id, week)` on the `guidance` table
/// plus a single `INSERT .. ON CONFLICT .. DO UPDATE` keeps one row per key.
#[derive(Clone)]
pub struct PgGuidanceStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgGuidanceStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Runs one store call under the configured timeout.
    ///
    /// A timeout only abandons the wait. A statement that already reached the
    /// server may still commit after the caller got `Unavailable`. Every call
    /// is a single atomic statement and `upsert` is idempotent, so a retry
    /// converges on the same row.
    async fn timed<T>(
        &self,
        op: &'static str,
        key: Option<(Uuid, Week)>,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| classify(op, key, e)),
            Err(_) => {
                let msg = format!("{op} timed out after {:?}", self.timeout);
                tracing::error!("❌ {}", msg);
                Err(StoreError::Unavailable(msg))
            }
        }
    }
}

fn classify(op: &'static str, key: Option<(Uuid, Week)>, e: sqlx::Error) -> StoreError {
    let unique_violation = match e.as_database_error() {
        Some(db_err) => {
            tracing::error!("❌ {} failed: {}", op, db_err.message());

            if let Some(code) = db_err.code() {
                tracing::info!("ℹ️ SQLSTATE code: {}", code);
            }

            if let Some(constraint) = db_err.constraint() {
                tracing::info!("🔒 Constraint violated: {}", constraint);
            }

            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
        }
        None => {
            tracing::error!("❌ {} failed: {}", op, e);
            false
        }
    };

    match e {
        sqlx::Error::Database(_) if unique_violation => match key {
            Some((user_id, week)) => StoreError::Conflict { user_id, week },
            None => StoreError::Backend(Box::new(e)),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(e.to_string()),
        e => StoreError::Backend(Box::new(e)),
    }
}

impl GuidanceStore for PgGuidanceStore {
    async fn find(&self, user_id: Uuid, week: Week) -> Result<Option<GuidanceRecord>, StoreError> {
        let sql = select("user_id = $1 AND week = $2");
        let row = self
            .timed(
                "find guidance",
                None,
                sqlx::query_as::<_, GuidanceRow>(&sql)
                    .bind(user_id)
                    .bind(i16::from(week.get()))
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(GuidanceRecord::try_from).transpose()
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<GuidanceRecord>, StoreError> {
        let sql = select("user_id = $1 ORDER BY week ASC");
        let rows = self
            .timed(
                "list guidance",
                None,
                sqlx::query_as::<_, GuidanceRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(GuidanceRecord::try_from).collect()
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        week: Week,
        content: GuidanceContent,
    ) -> Result<GuidanceRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO guidance (
                id, user_id, week, symptoms, activities, nutrition_recommendations,
                nutrition_food_to_avoid, nutrition_supplements, exercises, precautions, medical_tips
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, week) DO UPDATE SET
                symptoms = EXCLUDED.symptoms,
                activities = EXCLUDED.activities,
                nutrition_recommendations = EXCLUDED.nutrition_recommendations,
                nutrition_food_to_avoid = EXCLUDED.nutrition_food_to_avoid,
                nutrition_supplements = EXCLUDED.nutrition_supplements,
                exercises = EXCLUDED.exercises,
                precautions = EXCLUDED.precautions,
                medical_tips = EXCLUDED.medical_tips,
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        );

        let GuidanceContent {
            symptoms,
            activities,
            nutrition,
            exercises,
            precautions,
            medical_tips,
        } = content;

        let row = self
            .timed(
                "upsert guidance",
                Some((user_id, week)),
                sqlx::query_as::<_, GuidanceRow>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(user_id)
                    .bind(i16::from(week.get()))
                    .bind(symptoms)
                    .bind(activities)
                    .bind(nutrition.recommendations)
                    .bind(nutrition.food_to_avoid)
                    .bind(nutrition.supplements)
                    .bind(exercises)
                    .bind(precautions)
                    .bind(medical_tips)
                    .fetch_one(&self.pool),
            )
            .await?;

        GuidanceRecord::try_from(row)
    }
}
