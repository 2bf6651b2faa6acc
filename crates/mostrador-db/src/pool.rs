//! # Database Pool
//!
//! Opens the shop's SQLite file and hands out repositories.
//!
//! ```text
//! ServerConfig.database_path
//!       │
//!       ▼
//! DbConfig::new(path).max_connections(n)
//!       │
//!       ▼
//! Database::new(config) ── open pool ── migrations::run_migrations
//!       │
//!       ▼
//! AppState { db } ──► db.products() / db.sales() / db.inventory() ...
//!
//! GET  /api/productos     reader, any free connection
//! GET  /api/existencias   reader, any free connection
//! POST /api/venta         writer, BEGIN ... COMMIT
//! ```
//!
//! The journal runs in WAL mode so listing and stock queries keep going
//! while a sale is being written. Writers still serialize: a connection
//! that finds the write lock taken waits up to `busy_timeout` instead of
//! failing with `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::movement_type::MovementTypeRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::seller::SellerRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings; the server fills them from `database_path` and
/// `max_connections` in its config.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/mostrador/mostrador.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; created on first start.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections. Default 5.
    pub max_connections: u32,

    /// Connections kept open while idle. Default 1.
    pub min_connections: u32,

    /// How long a handler waits for a free connection. Default 30s.
    pub connect_timeout: Duration,

    /// Idle connections above the minimum close after this. Default 10 min.
    pub idle_timeout: Option<Duration>,

    /// How long a writer waits for SQLite's write lock. Default 5s.
    pub busy_timeout: Duration,

    /// Apply pending schema migrations when the pool opens. Default on.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database, one per call. Used by the test suites.
    ///
    /// Every pooled connection to `:memory:` would see its own empty
    /// database, so the pool is pinned to a single connection that never
    /// idles out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the shop database.
///
/// Cloning is cheap (the pool is reference counted), so the server keeps
/// one in its shared state and handlers ask it for repositories:
///
/// ```rust,ignore
/// async fn stock(State(state): State<AppState>, Path(codigo): Path<String>) -> ApiResult<Json<Stock>> {
///     let existencias = state.db.inventory().current_stock(&codigo).await?;
///     Ok(Json(Stock { codigo_producto: codigo, existencias }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file and brings the schema up to
    /// date.
    ///
    /// Connections are opened with WAL journaling, `synchronous = NORMAL`,
    /// foreign keys on and the configured busy timeout. Fails with
    /// [`DbError::ConnectionFailed`] if the file cannot be opened, or with
    /// the migration error if the schema cannot be applied.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // A crash may drop the last committed sale but never corrupts the file
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; the sale and ledger tables rely on them
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies the schema migrations not yet recorded in
    /// `_sqlx_migrations`. Safe to call on an up-to-date database.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Raw pool, for the health report and for tests that inspect tables
    /// directly.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// The single seller (issuer) record.
    pub fn seller(&self) -> SellerRepository {
        SellerRepository::new(self.pool.clone())
    }

    pub fn movement_types(&self) -> MovementTypeRepository {
        MovementTypeRepository::new(self.pool.clone())
    }

    /// Stock ledger: movement history, batch posting and stock sums.
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection. Called
    /// once on server shutdown.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_migrations_seed_system_movement_types() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let types = db.movement_types().list().await.unwrap();
        let codes: Vec<i64> = types.iter().map(|t| t.codigo).collect();
        assert_eq!(codes, mostrador_core::SYSTEM_MOVEMENT_TYPE_CODES.to_vec());
        assert!(types.iter().all(|t| t.es_sistema));
    }
}
