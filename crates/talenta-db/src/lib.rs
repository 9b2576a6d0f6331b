//! # talenta-db
//!
//! PostgreSQL database layer for talenta.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for files, jobs, and evaluations
//!
//! ## Example
//!
//! ```rust,ignore
//! use talenta_db::Database;
//! use talenta_core::JobRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/talenta").await?;
//!     let pending = db.jobs.pending_count().await?;
//!     println!("{pending} jobs queued");
//!     Ok(())
//! }
//! ```

pub mod evaluations;
pub mod files;
pub mod jobs;
pub mod pool;

// Re-export core types
pub use talenta_core::*;

// Re-export repository implementations
pub use evaluations::PgEvaluationRepository;
pub use files::PgFileRepository;
pub use jobs::PgJobRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Uploaded file repository.
    pub files: PgFileRepository,
    /// Evaluation job repository.
    pub jobs: PgJobRepository,
    /// Evaluation result repository.
    pub evaluations: PgEvaluationRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            files: PgFileRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            evaluations: PgEvaluationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
