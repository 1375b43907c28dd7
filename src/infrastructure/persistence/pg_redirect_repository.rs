//! PostgreSQL implementation of the redirect event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, error};

use super::ConnectionGate;
use crate::domain::entities::RedirectEvent;
use crate::domain::repositories::{AggregatedView, PAGE_SIZE, RedirectFilter, RedirectRepository};
use crate::error::StoreError;

#[derive(sqlx::FromRow)]
struct RedirectRow {
    alias: String,
    occurred_at: DateTime<Utc>,
    user_agent: String,
}

impl From<RedirectRow> for RedirectEvent {
    fn from(row: RedirectRow) -> Self {
        RedirectEvent {
            alias: row.alias,
            occurred_at: row.occurred_at,
            user_agent: row.user_agent,
        }
    }
}

/// PostgreSQL repository for redirect events.
///
/// Batches are written with one multi-row `INSERT`; analytics reads run the
/// count and page queries concurrently.
pub struct PgRedirectRepository {
    pool: Arc<PgPool>,
    gate: ConnectionGate,
}

impl PgRedirectRepository {
    /// Creates a new repository with a database connection pool and a shared gate.
    pub fn new(pool: Arc<PgPool>, gate: ConnectionGate) -> Self {
        Self { pool, gate }
    }
}

#[async_trait]
impl RedirectRepository for PgRedirectRepository {
    async fn insert_batch(&self, events: Vec<RedirectEvent>) -> Result<u64, StoreError> {
        if events.is_empty() {
            return Ok(0);
        }

        let _permit = self.gate.enter().await?;

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO redirects (alias, occurred_at, user_agent) ");
        builder.push_values(events.iter(), |mut row, event| {
            row.push_bind(event.alias.as_str())
                .push_bind(event.occurred_at)
                .push_bind(event.user_agent.as_str());
        });

        let result = builder
            .build()
            .execute(self.pool.as_ref())
            .await
            .inspect_err(|e| error!(error = %e, events = events.len(), "Redirect batch insert failed"))?;

        debug!(rows = result.rows_affected(), "Redirect batch inserted");
        Ok(result.rows_affected())
    }

    async fn list_by_alias(&self, alias: &str) -> Result<Vec<RedirectEvent>, StoreError> {
        let _permit = self.gate.enter().await?;

        let rows = sqlx::query_as::<_, RedirectRow>(
            r#"
            SELECT alias, occurred_at, user_agent
            FROM redirects
            WHERE alias = $1
            ORDER BY occurred_at
            "#,
        )
        .bind(alias)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn aggregate(&self, filter: RedirectFilter) -> Result<AggregatedView, StoreError> {
        // Count and page run on two connections at once.
        let _permit = self.gate.enter_many(2).await?;

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM redirects
            WHERE alias = $1
              AND ($2::timestamptz IS NULL OR occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR occurred_at <= $3)
              AND ($4::text IS NULL OR STRPOS(user_agent, $4) > 0)
            "#,
        )
        .bind(&filter.alias)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(filter.user_agent.as_deref())
        .fetch_one(self.pool.as_ref());

        let page = sqlx::query_as::<_, RedirectRow>(
            r#"
            SELECT alias, occurred_at, user_agent
            FROM redirects
            WHERE alias = $1
              AND ($2::timestamptz IS NULL OR occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR occurred_at <= $3)
              AND ($4::text IS NULL OR STRPOS(user_agent, $4) > 0)
            ORDER BY occurred_at
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(&filter.alias)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(filter.user_agent.as_deref())
        .bind(PAGE_SIZE)
        .bind(filter.offset())
        .fetch_all(self.pool.as_ref());

        let (total, rows) = tokio::try_join!(count, page)?;

        Ok(AggregatedView {
            alias: filter.alias,
            total,
            items: rows.into_iter().map(Into::into).collect(),
        })
    }
}
