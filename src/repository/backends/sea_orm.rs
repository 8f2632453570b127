use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait};
use tracing::{info, warn};

use crate::errors::{Result, ShortgateError};
use crate::repository::{LinkRecord, LinkRepository};

use migration::{Migrator, MigratorTrait, entities::link};

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmRepository {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortgateError::database_config(
                "database.url is not set".to_string(),
            ));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let repository = SeaOrmRepository {
            db,
            backend_name: backend_name.to_string(),
        };

        run_migrations(&repository.db).await?;

        info!(
            "{} repository initialized",
            repository.backend_name.to_uppercase()
        );
        Ok(repository)
    }

    /// Wrap an existing connection. Used by tests that manage their own
    /// database lifecycle.
    pub fn from_connection(db: DatabaseConnection, backend_name: &str) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
        }
    }

    fn model_to_record(model: link::Model) -> LinkRecord {
        LinkRecord {
            short_id: model.short_id,
            original_url: model.original_url,
            created_at: model.created_at,
        }
    }

    fn record_to_active_model(record: &LinkRecord) -> link::ActiveModel {
        use sea_orm::ActiveValue::Set;

        link::ActiveModel {
            short_id: Set(record.short_id.clone()),
            original_url: Set(record.original_url.clone()),
            created_at: Set(record.created_at),
        }
    }

    /// Whether a driver error is a unique constraint violation.
    fn is_unique_violation(err: &sea_orm::sqlx::Error) -> bool {
        use sea_orm::sqlx::Error;

        match err {
            Error::Database(db_err) => {
                let code = db_err.code();
                // SQLite: SQLITE_CONSTRAINT (code 2067 / 1555)
                // MySQL: ER_DUP_ENTRY (code 1062)
                // PostgreSQL: unique_violation (code 23505)
                code.as_ref()
                    .map(|c| c == "2067" || c == "1555" || c == "1062" || c == "23505")
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Connect to SQLite with auto-create and WAL tuning.
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::SqlitePool;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
    use std::str::FromStr;

    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ShortgateError::database_config(format!("SQLite URL parse failed: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
        ShortgateError::database_connection(format!("Failed to connect to SQLite: {}", e))
    })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Connect to MySQL/PostgreSQL with pool tuning.
pub async fn connect_generic(database_url: &str, backend_name: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(std::time::Duration::from_secs(8))
        .acquire_timeout(std::time::Duration::from_secs(8))
        .idle_timeout(std::time::Duration::from_secs(8))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        ShortgateError::database_connection(format!(
            "Failed to connect to {}: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| ShortgateError::storage(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}

#[async_trait]
impl LinkRepository for SeaOrmRepository {
    async fn insert(&self, record: LinkRecord) -> Result<()> {
        let active_model = Self::record_to_active_model(&record);

        match active_model.insert(&self.db).await {
            Ok(_) => {
                info!("Link created: {} -> {}", record.short_id, record.original_url);
                Ok(())
            }
            Err(
                sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(sqlx_err))
                | sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(sqlx_err)),
            ) if Self::is_unique_violation(&sqlx_err) =>
            {
                warn!("Short id collision on insert: {}", record.short_id);
                Err(ShortgateError::collision(format!(
                    "Short id already exists: {}",
                    record.short_id
                )))
            }
            Err(e) => Err(ShortgateError::storage(format!(
                "Failed to insert link: {}",
                e
            ))),
        }
    }

    async fn lookup(&self, short_id: &str) -> Result<Option<LinkRecord>> {
        let model = link::Entity::find_by_id(short_id)
            .one(&self.db)
            .await
            .map_err(|e| ShortgateError::storage(format!("Failed to query link: {}", e)))?;

        Ok(model.map(Self::model_to_record))
    }
}
