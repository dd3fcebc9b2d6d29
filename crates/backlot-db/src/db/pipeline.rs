//! Pipeline and pipeline app repository

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};

use backlot_core::models::{Pipeline, PipelineApp};

#[derive(Clone)]
pub struct PipelineRepository {
    pool: PgPool,
}

impl PipelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Pipeline>> {
        let p = sqlx::query_as::<Postgres, Pipeline>(
            r#"
            SELECT id, name, description
            FROM pipelines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get pipeline")?;
        Ok(p)
    }

    /// Apps referenced by a pipeline, in pipeline-defined order.
    pub async fn apps_in_order(&self, pipeline_id: i32) -> Result<Vec<PipelineApp>> {
        let rows = sqlx::query_as::<Postgres, PipelineApp>(
            r#"
            SELECT a.id, a.name, a.endpoint, a.description
            FROM pipeline_apps a
            JOIN pipeline_app_links l ON l.app_id = a.id
            WHERE l.pipeline_id = $1
            ORDER BY l.position
            "#,
        )
        .bind(pipeline_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pipeline apps")?;
        Ok(rows)
    }
}
