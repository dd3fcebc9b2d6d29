//! Catalog asset repository
//!
//! Assets are mirrored from the external catalog with insert-or-update
//! semantics keyed on the catalog id: an upsert replaces every catalog
//! attribute, while the media-file link is managed separately and survives
//! re-ingestion.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};

use backlot_core::models::CatalogAsset;

#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CatalogAsset>> {
        let a = sqlx::query_as::<Postgres, CatalogAsset>(
            r#"
            SELECT id, name, size, kind, format, thumbnails, media_file_guid
            FROM catalog_assets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get catalog asset")?;
        Ok(a)
    }

    /// Upsert one asset inside `tx`. Returns the number of affected rows
    /// (1 for both insert and update), which the ingestor sums per page.
    pub async fn upsert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        asset: &CatalogAsset,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO catalog_assets (id, name, size, kind, format, thumbnails)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                size = EXCLUDED.size,
                kind = EXCLUDED.kind,
                format = EXCLUDED.format,
                thumbnails = EXCLUDED.thumbnails
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.name)
        .bind(asset.size)
        .bind(asset.kind)
        .bind(&asset.format)
        .bind(&asset.thumbnails)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to upsert catalog asset {}", asset.id))?;
        Ok(result.rows_affected())
    }

    /// Attach an asset to a media file inside `tx`. Plain overwrite, so
    /// attaching an already-attached asset is a no-op rather than an error.
    pub async fn attach_media_file_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        asset_id: &str,
        guid: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE catalog_assets
            SET media_file_guid = $2
            WHERE id = $1
            "#,
        )
        .bind(asset_id)
        .bind(guid)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to attach asset {} to media file {}", asset_id, guid))?;
        Ok(())
    }
}
