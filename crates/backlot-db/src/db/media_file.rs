//! Media file repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use backlot_core::models::MediaFile;

#[derive(Clone)]
pub struct MediaFileRepository {
    pool: PgPool,
}

impl MediaFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, guid: &str) -> Result<Option<MediaFile>> {
        let m = sqlx::query_as::<Postgres, MediaFile>(
            r#"
            SELECT guid, created_at
            FROM media_files
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get media file")?;
        Ok(m)
    }

    /// Fetch the subset of `guids` that resolve to existing media files.
    /// The caller diffs against its input to report every unknown GUID.
    pub async fn find_existing(&self, guids: &[String]) -> Result<Vec<MediaFile>> {
        let rows = sqlx::query_as::<Postgres, MediaFile>(
            r#"
            SELECT guid, created_at
            FROM media_files
            WHERE guid = ANY($1)
            ORDER BY guid
            "#,
        )
        .bind(guids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to look up media files by guid")?;
        Ok(rows)
    }

    /// Look up a media file by GUID inside `tx`, creating it if absent.
    /// Idempotent: re-running for the same GUID returns the existing row.
    pub async fn get_or_create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        guid: &str,
    ) -> Result<MediaFile> {
        sqlx::query(
            r#"
            INSERT INTO media_files (guid, created_at)
            VALUES ($1, $2)
            ON CONFLICT (guid) DO NOTHING
            "#,
        )
        .bind(guid)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .context("Failed to insert media file")?;

        let m = sqlx::query_as::<Postgres, MediaFile>(
            r#"
            SELECT guid, created_at
            FROM media_files
            WHERE guid = $1
            "#,
        )
        .bind(guid)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to fetch media file after insert")?;
        Ok(m)
    }
}
