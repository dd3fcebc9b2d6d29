//! Collection repository

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};

use backlot_core::models::Collection;

#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Collection>> {
        let c = sqlx::query_as::<Postgres, Collection>(
            r#"
            SELECT id, name, description
            FROM collections
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get collection")?;
        Ok(c)
    }

    /// Fetch collections by id, preserving the caller's id order.
    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Collection>> {
        let rows = sqlx::query_as::<Postgres, Collection>(
            r#"
            SELECT id, name, description
            FROM collections
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get collections")?;
        Ok(rows)
    }

    pub async fn media_guids(&self, collection_id: i32) -> Result<Vec<String>> {
        use sqlx::Row;
        let rows = sqlx::query(
            r#"
            SELECT media_file_guid
            FROM media_file_collection_links
            WHERE collection_id = $1
            ORDER BY media_file_guid
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list collection media files")?;
        Ok(rows
            .iter()
            .map(|r| r.get::<String, _>("media_file_guid"))
            .collect())
    }
}
