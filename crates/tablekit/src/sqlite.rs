//! SQLite-backed table operations.

use crate::context::HostContext;
use crate::error::{TableError, TableResult};
use crate::ident::{count_expression, quote_ident};
use crate::logging::Logger;
use crate::schema;
use crate::worker::TableOps;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

/// Table operations over an SQLite pool.
pub struct SqliteWorker {
    pool: Pool<Sqlite>,
    ctx: HostContext,
    last_error: Mutex<String>,
}

impl SqliteWorker {
    /// Open (creating if missing) a database file and build a worker.
    pub async fn open(path: impl AsRef<Path>, ctx: HostContext) -> TableResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // A single connection serializes all statements, matching the
            // one-connection-owned-by-the-host execution model.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        tracing::debug!(path = %path.display(), "opened table worker database");
        Ok(Self::from_pool(pool, ctx))
    }

    /// In-memory database, mostly useful for tests.
    pub async fn in_memory(ctx: HostContext) -> TableResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Self::from_pool(pool, ctx))
    }

    /// Build a worker over an existing pool.
    pub fn from_pool(pool: Pool<Sqlite>, ctx: HostContext) -> Self {
        Self {
            pool,
            ctx,
            last_error: Mutex::new(String::new()),
        }
    }

    /// The underlying connection pool, for callers issuing their own queries.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// The host context this worker logs and names against.
    pub fn context(&self) -> &HostContext {
        &self.ctx
    }

    /// Record an operation outcome into the last-error buffer.
    fn record<T>(&self, result: TableResult<T>) -> TableResult<T> {
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        match &result {
            Ok(_) => last.clear(),
            Err(err) => *last = err.to_string(),
        }
        result
    }
}

#[async_trait]
impl TableOps for SqliteWorker {
    async fn create_table(
        &self,
        table: &str,
        schema_fragment: &str,
        logger: &Logger,
    ) -> TableResult<()> {
        if let Err(err) = schema::apply_table_schema(&self.pool, table, schema_fragment).await {
            logger.log(
                &self.ctx,
                &format!("Error while creating the DB table {table}: {err}"),
            );
            return self.record(Err(err));
        }

        let exists = match self.table_exists(table).await {
            Ok(exists) => exists,
            Err(err) => return self.record(Err(err)),
        };
        if !exists {
            logger.log(&self.ctx, &format!("Creation of the DB table {table} failed."));
            return self.record(Err(TableError::Postcondition {
                table: table.to_string(),
                detail: "table missing after create".to_string(),
            }));
        }

        self.record(Ok(()))
    }

    async fn table_exists(&self, table: &str) -> TableResult<bool> {
        let result: TableResult<bool> = async {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
            // Exact comparison guards against any pattern-level surprises.
            Ok(found.as_deref() == Some(table))
        }
        .await;
        self.record(result)
    }

    async fn delete_table(&self, table: &str, logger: &Logger) -> TableResult<()> {
        let dropped = sqlx::query(&format!("DROP TABLE {}", quote_ident(table)))
            .execute(&self.pool)
            .await;

        let result: TableResult<()> = match dropped {
            Err(err) => Err(err.into()),
            Ok(_) => {
                let exists = match self.table_exists(table).await {
                    Ok(exists) => exists,
                    Err(err) => return self.record(Err(err)),
                };
                if exists {
                    Err(TableError::Postcondition {
                        table: table.to_string(),
                        detail: "table still exists after drop".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
        };

        if result.is_err() {
            logger.log(&self.ctx, &format!("Deletion of the DB table {table} failed."));
        }
        self.record(result)
    }

    async fn reinit_table(&self, table: &str) -> TableResult<()> {
        let result: TableResult<()> = async {
            sqlx::query(&format!("DELETE FROM {}", quote_ident(table)))
                .execute(&self.pool)
                .await?;

            // SQLite has no TRUNCATE; resetting the sequence row restores
            // the autoincrement counter. The sequence table only exists
            // once an AUTOINCREMENT table has inserted rows.
            let has_sequence: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence')",
            )
            .fetch_one(&self.pool)
            .await?;
            if has_sequence {
                sqlx::query("DELETE FROM sqlite_sequence WHERE name = ?")
                    .bind(table)
                    .execute(&self.pool)
                    .await?;
            }
            Ok(())
        }
        .await;
        self.record(result)
    }

    async fn empty_table(&self, table: &str) -> TableResult<u64> {
        let result: TableResult<u64> = async {
            let done = sqlx::query(&format!("DELETE FROM {}", quote_ident(table)))
                .execute(&self.pool)
                .await?;
            Ok(done.rows_affected())
        }
        .await;
        self.record(result)
    }

    async fn clone_table(&self, table: &str, new_table: &str) -> TableResult<()> {
        let result: TableResult<()> = async {
            let ddl: Option<String> =
                sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(table)
                    .fetch_optional(&self.pool)
                    .await?;
            let Some(ddl) = ddl else {
                return Err(TableError::Query(format!(
                    "source table {table} does not exist"
                )));
            };

            let sql = rewrite_create_target(&ddl, table, new_table)?;
            sqlx::query(&sql).execute(&self.pool).await?;
            Ok(())
        }
        .await;
        self.record(result)
    }

    async fn copy_table(&self, table: &str, new_table: &str) -> TableResult<u64> {
        let result: TableResult<u64> = async {
            let done = sqlx::query(&format!(
                "INSERT INTO {} SELECT * FROM {}",
                quote_ident(new_table),
                quote_ident(table)
            ))
            .execute(&self.pool)
            .await?;
            Ok(done.rows_affected())
        }
        .await;
        self.record(result)
    }

    async fn count_table_rows(&self, table: &str, column: &str) -> TableResult<u64> {
        let result: TableResult<u64> = async {
            let expression = count_expression(column);
            let count: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT({expression}) FROM {}",
                quote_ident(table)
            ))
            .fetch_one(&self.pool)
            .await?;
            Ok(count as u64)
        }
        .await;
        self.record(result)
    }

    fn last_error(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Retarget catalog DDL (`CREATE TABLE <old> (...)`) at a new table name.
fn rewrite_create_target(ddl: &str, table: &str, new_table: &str) -> TableResult<String> {
    let Some(paren) = ddl.find('(') else {
        return Err(TableError::Query(format!(
            "unexpected catalog DDL for table {table}"
        )));
    };
    Ok(format!(
        "CREATE TABLE {} {}",
        quote_ident(new_table),
        &ddl[paren..]
    ))
}
