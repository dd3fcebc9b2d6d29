//! Batch repository
//!
//! Membership lives in `media_file_batch_links` with a composite primary
//! key, so a media file appears at most once per batch. Lifecycle
//! operations that copy or union memberships rely on `ON CONFLICT DO
//! NOTHING` for set semantics.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};

use backlot_core::models::{Batch, Mmif};

#[derive(Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Batch>> {
        let b = sqlx::query_as::<Postgres, Batch>(
            r#"
            SELECT id, name, description, pipeline_id
            FROM batches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get batch")?;
        Ok(b)
    }

    /// Fetch batches by id, preserving the caller's id order.
    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Batch>> {
        let rows = sqlx::query_as::<Postgres, Batch>(
            r#"
            SELECT id, name, description, pipeline_id
            FROM batches
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get batches")?;
        Ok(rows)
    }

    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        description: &str,
        pipeline_id: Option<i32>,
    ) -> Result<Batch> {
        let b = sqlx::query_as::<Postgres, Batch>(
            r#"
            INSERT INTO batches (name, description, pipeline_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, pipeline_id
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(pipeline_id)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to create batch")?;
        Ok(b)
    }

    /// Add media files to a batch inside `tx`. Set semantics: a guid
    /// already present in the batch is left untouched.
    pub async fn add_media_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch_id: i32,
        guids: &[String],
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO media_file_batch_links (media_file_guid, batch_id)
            SELECT g, $2 FROM UNNEST($1::text[]) AS g
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(guids)
        .bind(batch_id)
        .execute(&mut **tx)
        .await
        .context("Failed to add media files to batch")?;
        Ok(result.rows_affected())
    }

    pub async fn media_guids(&self, batch_id: i32) -> Result<Vec<String>> {
        use sqlx::Row;
        let rows = sqlx::query(
            r#"
            SELECT media_file_guid
            FROM media_file_batch_links
            WHERE batch_id = $1
            ORDER BY media_file_guid
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list batch media files")?;
        Ok(rows
            .iter()
            .map(|r| r.get::<String, _>("media_file_guid"))
            .collect())
    }

    /// Artifacts declared as this batch's inputs.
    pub async fn input_mmifs(&self, batch_id: i32) -> Result<Vec<Mmif>> {
        let rows = sqlx::query_as::<Postgres, Mmif>(
            r#"
            SELECT m.id, m.created_at, m.media_file_guid, m.run_id, m.batch_output_id, m.location
            FROM mmifs m
            JOIN mmif_batch_input_links l ON l.mmif_id = m.id
            WHERE l.batch_id = $1
            ORDER BY m.id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list batch input MMIFs")?;
        Ok(rows)
    }

    /// Declare artifacts as inputs of a batch inside `tx`. The caller is
    /// responsible for the one-input-per-media-file invariant.
    pub async fn attach_input_mmifs_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch_id: i32,
        mmif_ids: &[i32],
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO mmif_batch_input_links (mmif_id, batch_id)
            SELECT m, $2 FROM UNNEST($1::int[]) AS m
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(mmif_ids)
        .bind(batch_id)
        .execute(&mut **tx)
        .await
        .context("Failed to attach input MMIFs to batch")?;
        Ok(result.rows_affected())
    }
}
