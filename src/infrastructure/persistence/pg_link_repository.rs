//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

use super::ConnectionGate;
use crate::domain::entities::ShortLink;
use crate::domain::repositories::LinkRepository;
use crate::error::StoreError;

#[derive(sqlx::FromRow)]
struct ShortLinkRow {
    alias: String,
    original: String,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(row: ShortLinkRow) -> Self {
        ShortLink::new(row.alias, row.original)
    }
}

/// PostgreSQL repository for alias → URL mappings.
///
/// Every call holds a [`ConnectionGate`] permit for its whole duration.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
    gate: ConnectionGate,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool and a shared gate.
    pub fn new(pool: Arc<PgPool>, gate: ConnectionGate) -> Self {
        Self { pool, gate }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, link: ShortLink) -> Result<ShortLink, StoreError> {
        let _permit = self.gate.enter().await?;

        let row = sqlx::query_as::<_, ShortLinkRow>(
            r#"
            INSERT INTO short_links (alias, original)
            VALUES ($1, $2)
            RETURNING alias, original
            "#,
        )
        .bind(&link.alias)
        .bind(&link.original)
        .fetch_one(self.pool.as_ref())
        .await?;

        debug!(alias = %row.alias, "Short link stored");
        Ok(row.into())
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, StoreError> {
        let _permit = self.gate.enter().await?;

        let row = sqlx::query_as::<_, ShortLinkRow>(
            r#"
            SELECT alias, original
            FROM short_links
            WHERE alias = $1
            "#,
        )
        .bind(alias)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }
}
