//! Local database lookup against a curated `oid_names` table.

use async_trait::async_trait;
use sqlx::PgPool;

use super::LookupSource;
use crate::errors::SourceError;
use crate::models::resolution::SourceHit;

/// Source name reported for local database hits.
pub const LOCAL_DB_SOURCE: &str = "local-db";

/// Row shape of the `oid_names` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OidNameRow {
    name: String,
    description: Option<String>,
}

/// Looks identifiers up in `oid_names (oid TEXT PRIMARY KEY, name TEXT, description TEXT)`.
#[derive(Debug, Clone)]
pub struct LocalDbLookup {
    pool: PgPool,
}

impl LocalDbLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupSource for LocalDbLookup {
    fn name(&self) -> &str {
        LOCAL_DB_SOURCE
    }

    async fn lookup(&self, identifier: &str) -> Result<Option<SourceHit>, SourceError> {
        let row = sqlx::query_as::<_, OidNameRow>(
            "SELECT name, description FROM oid_names WHERE oid = $1 LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SourceHit {
            name: r.name,
            description: r.description,
        }))
    }
}
