//! Schema version store
//!
//! Owns the single persisted fact this tool manages: which versions have been
//! applied. One row per applied up-migration; the current version is
//! recomputed as `MAX(version)` on every run. Each migration step runs its
//! script statements and the bookkeeping write inside one transaction, so the
//! recorded version can never diverge from the schema the scripts produced.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::{LadderError, LadderResult};

/// Seam over the database for version bookkeeping and script execution.
///
/// The engine only ever talks to this trait; the production implementation is
/// [`PgVersionStore`].
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Idempotently create the version-tracking table. Safe on every run.
    async fn ensure_schema(&self) -> LadderResult<()>;

    /// Highest recorded version, 0 when no migrations have been applied.
    async fn current_version(&self) -> LadderResult<i64>;

    /// Execute an up-script and record its version, atomically.
    async fn apply_up(&self, version: i64, sql: &str) -> LadderResult<()>;

    /// Execute a down-script and delete its version record, atomically.
    async fn revert_down(&self, version: i64, sql: &str) -> LadderResult<()>;
}

/// Split a migration script into individual statements.
///
/// sqlx executes one prepared statement at a time, so multi-statement scripts
/// must be split first. Parsing uses the generic SQL dialect; scripts the
/// parser cannot handle fall back to naive semicolon splitting.
pub fn split_statements(sql: &str) -> Vec<String> {
    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(parsed) => parsed.iter().map(|stmt| format!("{};", stmt)).collect(),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
            sql.split(';')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| format!("{};", s))
                .collect()
        }
    }
}

/// PostgreSQL-backed version store
pub struct PgVersionStore {
    pool: PgPool,
    table: String,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_table(pool, "schema_version")
    }

    pub fn with_table(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// SQL to create the version-tracking table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version BIGINT PRIMARY KEY,\n    \
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP\n\
            );",
            self.table
        )
    }

    /// SQL to read the current version
    pub fn current_version_sql(&self) -> String {
        format!("SELECT COALESCE(MAX(version), 0) FROM {}", self.table)
    }

    /// SQL to record an applied version. The primary key rejects a version
    /// that was already applied.
    pub fn record_applied_sql(&self) -> String {
        format!("INSERT INTO {} (version) VALUES ($1)", self.table)
    }

    /// SQL to delete a reverted version's record
    pub fn record_reverted_sql(&self) -> String {
        format!("DELETE FROM {} WHERE version = $1", self.table)
    }

    async fn execute_script<'t>(
        &self,
        transaction: &mut sqlx::Transaction<'t, sqlx::Postgres>,
        version: i64,
        sql: &str,
    ) -> LadderResult<()> {
        for statement in split_statements(sql) {
            if statement.trim().is_empty() {
                continue;
            }
            sqlx::query(&statement)
                .execute(&mut **transaction)
                .await
                .map_err(|e| {
                    LadderError::Storage(format!(
                        "failed to execute migration {}: {}",
                        version, e
                    ))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn ensure_schema(&self) -> LadderResult<()> {
        let sql = self.create_table_sql();
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                LadderError::Storage(format!("failed to create version table: {}", e))
            })?;
        tracing::debug!("Version table '{}' is present", self.table);
        Ok(())
    }

    async fn current_version(&self) -> LadderResult<i64> {
        let sql = self.current_version_sql();
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                LadderError::Storage(format!("failed to read current version: {}", e))
            })?;

        let version: i64 = row
            .try_get(0)
            .map_err(|e| LadderError::Storage(format!("failed to decode version: {}", e)))?;
        Ok(version)
    }

    async fn apply_up(&self, version: i64, sql: &str) -> LadderResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| LadderError::Storage(format!("failed to start transaction: {}", e)))?;

        self.execute_script(&mut transaction, version, sql).await?;

        let record_sql = self.record_applied_sql();
        sqlx::query(&record_sql)
            .bind(version)
            .execute(&mut *transaction)
            .await
            .map_err(|e| {
                LadderError::Storage(format!("failed to record version {}: {}", version, e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| LadderError::Storage(format!("failed to commit migration: {}", e)))?;

        tracing::info!("Applied version {}", version);
        Ok(())
    }

    async fn revert_down(&self, version: i64, sql: &str) -> LadderResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| LadderError::Storage(format!("failed to start transaction: {}", e)))?;

        self.execute_script(&mut transaction, version, sql).await?;

        let record_sql = self.record_reverted_sql();
        sqlx::query(&record_sql)
            .bind(version)
            .execute(&mut *transaction)
            .await
            .map_err(|e| {
                LadderError::Storage(format!(
                    "failed to remove version record {}: {}",
                    version, e
                ))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| LadderError::Storage(format!("failed to commit rollback: {}", e)))?;

        tracing::info!("Reverted version {}", version);
        Ok(())
    }
}
