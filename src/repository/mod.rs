//! Link persistence
//!
//! The `links` table is the only durable state in the system. Uniqueness of
//! the short identifier is enforced by the primary key constraint in the
//! backing store, never by a read-before-write check: concurrent writers
//! racing on the same identifier must have exactly one succeed and the rest
//! observe a collision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortgateError};

pub mod backends;

/// One shortened link. Immutable once inserted; never deleted by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub short_id: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait LinkRepository: Send + Sync {
    /// Insert a new link. Fails with `ShortgateError::Collision` when the
    /// short id already exists; the caller retries with a fresh id.
    async fn insert(&self, record: LinkRecord) -> Result<()>;

    /// Look up a link by short id. `Ok(None)` is a miss; `Err` is a storage
    /// fault, which callers must not conflate with a miss.
    async fn lookup(&self, short_id: &str) -> Result<Option<LinkRecord>>;
}

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn LinkRepository>> {
        match config.backend.as_str() {
            "sqlite" | "mysql" | "postgres" | "mariadb" => {
                let repository =
                    backends::sea_orm::SeaOrmRepository::new(&config.url, &config.backend).await?;
                Ok(Arc::new(repository) as Arc<dyn LinkRepository>)
            }
            other => {
                error!("Unknown repository backend: {}", other);
                Err(ShortgateError::database_config(format!(
                    "Unknown repository backend: {}. Supported: sqlite, mysql, postgres, mariadb",
                    other
                )))
            }
        }
    }
}
