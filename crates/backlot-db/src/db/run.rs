//! Run repository
//!
//! Run rows are keyed by the external workflow system's run id. Status
//! updates are plain overwrites of the mirrored fields, so replaying a
//! delivery is safe and concurrent deliveries resolve last-write-wins.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, Postgres};

use backlot_core::models::{Run, RunStatus};

#[derive(Clone)]
pub struct RunRepository {
    pool: PgPool,
}

impl RunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, run_id: &str) -> Result<Option<Run>> {
        let r = sqlx::query_as::<Postgres, Run>(
            r#"
            SELECT id, pathspec, batch_id, media_file_guid, created_at,
                finished, finished_at, successful, current_step, current_task
            FROM runs
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get run")?;
        Ok(r)
    }

    /// Register a run record with `finished = false, successful = NULL`.
    /// Id collisions return the existing row untouched; the run id is
    /// minted by the external system, not by us.
    pub async fn create(
        &self,
        run_id: &str,
        pathspec: &str,
        batch_id: Option<i32>,
        media_file_guid: Option<&str>,
    ) -> Result<Run> {
        sqlx::query(
            r#"
            INSERT INTO runs (id, pathspec, batch_id, media_file_guid, created_at, finished)
            VALUES ($1, $2, $3, $4, $5, false)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(run_id)
        .bind(pathspec)
        .bind(batch_id)
        .bind(media_file_guid)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create run")?;

        let r = sqlx::query_as::<Postgres, Run>(
            r#"
            SELECT id, pathspec, batch_id, media_file_guid, created_at,
                finished, finished_at, successful, current_step, current_task
            FROM runs
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch run after insert")?;
        Ok(r)
    }

    /// Overwrite the mirrored status fields from an authoritative snapshot.
    /// Returns the number of updated rows (0 when the run is unknown).
    pub async fn apply_status(&self, run_id: &str, status: &RunStatus) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET finished = $2,
                finished_at = $3,
                successful = $4,
                current_step = $5,
                current_task = $6
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(status.finished)
        .bind(status.finished_at)
        .bind(status.successful)
        .bind(&status.current_step)
        .bind(&status.current_task)
        .execute(&self.pool)
        .await
        .context("Failed to apply run status")?;
        Ok(result.rows_affected())
    }

    /// GUIDs of media files that have at least one run scoped to `batch_id`.
    /// The complement of this set against the batch membership is the list
    /// of members not yet dispatched.
    pub async fn guids_with_runs(&self, batch_id: i32) -> Result<Vec<String>> {
        use sqlx::Row;
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT media_file_guid
            FROM runs
            WHERE batch_id = $1 AND media_file_guid IS NOT NULL
            ORDER BY media_file_guid
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list run guids for batch")?;
        Ok(rows
            .iter()
            .map(|r| r.get::<String, _>("media_file_guid"))
            .collect())
    }
}
