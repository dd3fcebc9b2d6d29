//! MMIF artifact repository

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};

use backlot_core::models::Mmif;

#[derive(Clone)]
pub struct MmifRepository {
    pool: PgPool,
}

impl MmifRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Mmif>> {
        let rows = sqlx::query_as::<Postgres, Mmif>(
            r#"
            SELECT id, created_at, media_file_guid, run_id, batch_output_id, location
            FROM mmifs
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get MMIFs")?;
        Ok(rows)
    }

    /// The most recently created artifact for a media file, if any. Used as
    /// the fallback input when a batch declares no input for that member.
    pub async fn latest_for_media_file(&self, guid: &str) -> Result<Option<Mmif>> {
        let m = sqlx::query_as::<Postgres, Mmif>(
            r#"
            SELECT id, created_at, media_file_guid, run_id, batch_output_id, location
            FROM mmifs
            WHERE media_file_guid = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(guid)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest MMIF for media file")?;
        Ok(m)
    }

    /// Artifacts produced by the given batches (output role).
    pub async fn outputs_for_batches(&self, batch_ids: &[i32]) -> Result<Vec<Mmif>> {
        let rows = sqlx::query_as::<Postgres, Mmif>(
            r#"
            SELECT id, created_at, media_file_guid, run_id, batch_output_id, location
            FROM mmifs
            WHERE batch_output_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(batch_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list batch output MMIFs")?;
        Ok(rows)
    }
}
