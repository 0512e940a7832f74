//! Tier-3 store (C4): the authoritative, durable relational store.
//!
//! Unique index on `(video_id, language, clean_flag)` for artifacts and on
//! `job_id` for jobs. Reads never hold write locks; every write goes through
//! a single-row upsert.

use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use ytx_models::{Artifact, Fingerprint, JobRecord, WebhookDeliveryStatus};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::rows::{delivery_status_str, job_status_str, ArtifactRow, JobRow};

#[derive(Clone)]
pub struct StoreClient {
    pool: PgPool,
    retention_days: i64,
}

impl StoreClient {
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool, retention_days: config.retention_days })
    }

    pub async fn from_env() -> StoreResult<Self> {
        Self::connect(&StoreConfig::from_env()).await
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS artifact (
                video_id TEXT NOT NULL,
                language TEXT NOT NULL,
                clean_flag BOOLEAN NOT NULL,
                title TEXT,
                segments JSONB NOT NULL,
                plain_text TEXT,
                engine_used TEXT NOT NULL,
                integrity TEXT NOT NULL,
                extraction_duration_ms BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (video_id, language, clean_flag)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job (
                job_id TEXT PRIMARY KEY,
                video_id TEXT NOT NULL,
                language TEXT NOT NULL,
                clean_flag BOOLEAN NOT NULL,
                status TEXT NOT NULL,
                error_kind TEXT,
                enqueued_at TIMESTAMPTZ NOT NULL,
                started_at TIMESTAMPTZ,
                ended_at TIMESTAMPTZ,
                webhook_url TEXT,
                webhook_delivery_status TEXT NOT NULL,
                attempts INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Single-row upsert keyed by the unique fingerprint index. Concurrent
    /// commits for the same `F` converge by last-writer-wins, which is safe
    /// because the single-flight lock in the coordinator ensures only the
    /// leader calls commit (§5).
    pub async fn upsert_artifact(&self, artifact: &Artifact) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO artifact (
                video_id, language, clean_flag, title, segments, plain_text,
                engine_used, integrity, extraction_duration_ms, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (video_id, language, clean_flag) DO UPDATE SET
                title = EXCLUDED.title,
                segments = EXCLUDED.segments,
                plain_text = EXCLUDED.plain_text,
                engine_used = EXCLUDED.engine_used,
                integrity = EXCLUDED.integrity,
                extraction_duration_ms = EXCLUDED.extraction_duration_ms,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&artifact.fingerprint.video_id)
        .bind(&artifact.fingerprint.language)
        .bind(artifact.fingerprint.clean_flag)
        .bind(&artifact.title)
        .bind(Json(&artifact.segments))
        .bind(&artifact.plain_text)
        .bind(artifact.engine_used.as_str())
        .bind(&artifact.integrity)
        .bind(artifact.extraction_duration_ms as i64)
        .bind(artifact.created_at)
        .bind(artifact.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(fingerprint = %artifact.fingerprint, "upserted artifact");
        Ok(())
    }

    pub async fn get_artifact(&self, fingerprint: &Fingerprint) -> StoreResult<Option<Artifact>> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            r#"
            SELECT video_id, language, clean_flag, title, segments, plain_text,
                   engine_used, integrity, extraction_duration_ms, created_at, expires_at
            FROM artifact
            WHERE video_id = $1 AND language = $2 AND clean_flag = $3
            "#,
        )
        .bind(&fingerprint.video_id)
        .bind(&fingerprint.language)
        .bind(fingerprint.clean_flag)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ArtifactRow::into_artifact))
    }

    /// Delete a single artifact row by its unique fingerprint index.
    /// Used by admin `clear_cache(scope=durable, fingerprint)` (§6); unlike
    /// the retention sweep this is an operator-triggered point deletion.
    pub async fn delete_artifact(&self, fingerprint: &Fingerprint) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"DELETE FROM artifact WHERE video_id = $1 AND language = $2 AND clean_flag = $3"#,
        )
        .bind(&fingerprint.video_id)
        .bind(&fingerprint.language)
        .bind(fingerprint.clean_flag)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Retention sweep: deletes artifacts older than the configured window.
    /// Returns the number of rows deleted.
    pub async fn sweep_expired_artifacts(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"DELETE FROM artifact WHERE created_at < now() - ($1 || ' days')::interval"#,
        )
        .bind(self.retention_days)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, retention_days = self.retention_days, "swept expired artifacts");
        }
        Ok(deleted)
    }

    pub async fn upsert_job(&self, job: &JobRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO job (
                job_id, video_id, language, clean_flag, status, error_kind,
                enqueued_at, started_at, ended_at, webhook_url, webhook_delivery_status, attempts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (job_id) DO UPDATE SET
                status = EXCLUDED.status,
                error_kind = EXCLUDED.error_kind,
                started_at = EXCLUDED.started_at,
                ended_at = EXCLUDED.ended_at,
                webhook_delivery_status = EXCLUDED.webhook_delivery_status,
                attempts = EXCLUDED.attempts
            "#,
        )
        .bind(job.job_id.as_str())
        .bind(&job.fingerprint.video_id)
        .bind(&job.fingerprint.language)
        .bind(job.fingerprint.clean_flag)
        .bind(job_status_str(job.status))
        .bind(job.error_kind.map(|k| k.as_str()))
        .bind(job.enqueued_at)
        .bind(job.started_at)
        .bind(job.ended_at)
        .bind(&job.webhook_url)
        .bind(delivery_status_str(job.webhook_delivery_status))
        .bind(job.attempts as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_job(&self, job_id: &str) -> StoreResult<Option<JobRecord>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, video_id, language, clean_flag, status, error_kind,
                   enqueued_at, started_at, ended_at, webhook_url, webhook_delivery_status, attempts
            FROM job
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(JobRow::into_job_record))
    }

    pub async fn set_webhook_delivery_status(
        &self,
        job_id: &str,
        status: WebhookDeliveryStatus,
        attempts: u32,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE job SET webhook_delivery_status = $1, attempts = $2 WHERE job_id = $3"#,
        )
        .bind(delivery_status_str(status))
        .bind(attempts as i32)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {job_id}")));
        }
        Ok(())
    }

    /// Jobs still `running` whose lease has expired; candidates for the
    /// reaper to reset to `queued` (§4.7, §4.9).
    pub async fn find_expired_running_jobs(&self, lease_seconds: i64) -> StoreResult<Vec<JobRecord>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, video_id, language, clean_flag, status, error_kind,
                   enqueued_at, started_at, ended_at, webhook_url, webhook_delivery_status, attempts
            FROM job
            WHERE status = 'running' AND started_at < now() - ($1 || ' seconds')::interval
            "#,
        )
        .bind(lease_seconds)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JobRow::into_job_record).collect())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
