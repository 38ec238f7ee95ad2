//! Persistent key-value options with site and network scopes.

use crate::error::TableResult;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

/// Storage scope for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionScope {
    /// Per-site option.
    Site,
    /// Network-wide option shared by all sites.
    Network,
}

impl OptionScope {
    fn as_str(self) -> &'static str {
        match self {
            OptionScope::Site => "site",
            OptionScope::Network => "network",
        }
    }
}

/// Key-value option storage.
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Integer option value; 0 when absent or unparsable.
    async fn get_int(&self, key: &str, scope: OptionScope) -> TableResult<i64>;

    /// Set an integer option, creating or replacing it.
    async fn set_int(&self, key: &str, value: i64, scope: OptionScope) -> TableResult<()>;

    /// Delete an option. Deleting an absent option is not an error.
    async fn delete(&self, key: &str, scope: OptionScope) -> TableResult<()>;
}

const OPTIONS_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS options (
    option_key TEXT NOT NULL,
    scope TEXT NOT NULL,
    option_value TEXT NOT NULL,
    PRIMARY KEY (option_key, scope)
)";

/// Option storage in an `options` table on a shared pool.
pub struct SqliteOptionStore {
    pool: Pool<Sqlite>,
}

impl SqliteOptionStore {
    /// Create the backing table when missing and build the store.
    pub async fn new(pool: Pool<Sqlite>) -> TableResult<Self> {
        sqlx::query(OPTIONS_SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl OptionStore for SqliteOptionStore {
    async fn get_int(&self, key: &str, scope: OptionScope) -> TableResult<i64> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT option_value FROM options WHERE option_key = ? AND scope = ?",
        )
        .bind(key)
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    async fn set_int(&self, key: &str, value: i64, scope: OptionScope) -> TableResult<()> {
        sqlx::query(
            "INSERT INTO options (option_key, scope, option_value) VALUES (?, ?, ?) \
             ON CONFLICT(option_key, scope) DO UPDATE SET option_value = excluded.option_value",
        )
        .bind(key)
        .bind(scope.as_str())
        .bind(value.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str, scope: OptionScope) -> TableResult<()> {
        sqlx::query("DELETE FROM options WHERE option_key = ? AND scope = ?")
            .bind(key)
            .bind(scope.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
