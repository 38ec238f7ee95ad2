//! Table operations contract.

use crate::error::TableResult;
use crate::ident::{self, Value};
use crate::logging::Logger;
use async_trait::async_trait;

/// Single-table SQL operations.
///
/// Callers must run every table name through [`TableOps::sanitize_table_name`]
/// before handing it to any other method; full (prefixed) names are
/// interpolated into SQL text.
///
/// Every operation is a single synchronous submission with no retry.
/// Failures come back as `Err`; gated logging is best effort and never
/// changes the returned result.
#[async_trait]
pub trait TableOps: Send + Sync {
    /// Create the table, or additively upgrade it when it already exists.
    /// Succeeds only when no error was reported AND the table is observed
    /// to exist afterwards.
    async fn create_table(
        &self,
        table: &str,
        schema_fragment: &str,
        logger: &Logger,
    ) -> TableResult<()>;

    /// Whether the table exists, by exact name match against the catalog.
    async fn table_exists(&self, table: &str) -> TableResult<bool>;

    /// Drop the table. Succeeds only when the drop was accepted AND the
    /// table no longer exists.
    async fn delete_table(&self, table: &str, logger: &Logger) -> TableResult<()>;

    /// Truncate: delete all rows and reset the autoincrement counter.
    async fn reinit_table(&self, table: &str) -> TableResult<()>;

    /// Delete all rows without touching the autoincrement counter.
    /// Returns the number of deleted rows.
    async fn empty_table(&self, table: &str) -> TableResult<u64>;

    /// Clone the table's structure (no rows) under a new name. Errors when
    /// the source table does not exist.
    async fn clone_table(&self, table: &str, new_table: &str) -> TableResult<()>;

    /// Copy all rows into another table of the same shape. Returns the
    /// number of inserted rows.
    async fn copy_table(&self, table: &str, new_table: &str) -> TableResult<u64>;

    /// Row count. `column` is `*` for all rows, a column name, or a
    /// `DISTINCT <column>` form.
    async fn count_table_rows(&self, table: &str, column: &str) -> TableResult<u64>;

    /// Most recent error recorded by this worker; empty when the last
    /// operation succeeded.
    fn last_error(&self) -> String;

    /// See [`ident::sanitize_table_name`].
    fn sanitize_table_name(&self, raw: &str) -> Option<String> {
        ident::sanitize_table_name(raw)
    }

    /// See [`ident::prepare_values_list`].
    fn prepare_values_list(&self, values: &[Value]) -> String {
        ident::prepare_values_list(values)
    }
}
