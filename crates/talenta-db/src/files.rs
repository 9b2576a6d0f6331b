//! File repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use talenta_core::{DocumentKind, Error, FileRepository, Result, StoredFile};

/// PostgreSQL implementation of FileRepository.
pub struct PgFileRepository {
    pool: Pool<Postgres>,
}

impl PgFileRepository {
    /// Create a new PgFileRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_file_row(row: sqlx::postgres::PgRow) -> StoredFile {
        let kind: String = row.get("kind");
        StoredFile {
            id: row.get("id"),
            kind: kind.parse().unwrap_or(DocumentKind::Cv),
            path: row.get("path"),
            original_name: row.get("original_name"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn save(
        &self,
        kind: DocumentKind,
        path: &str,
        original_name: Option<&str>,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO candidate_file (id, kind, path, original_name, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(path)
        .bind(original_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredFile>> {
        let row = sqlx::query(
            "SELECT id, kind, path, original_name, created_at
             FROM candidate_file WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_file_row))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM candidate_file WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(exists.0)
    }
}
