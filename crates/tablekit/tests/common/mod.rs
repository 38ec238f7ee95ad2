//! Shared test fixtures.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tablekit::{
    HostContext, Logger, SqliteOptionStore, SqliteWorker, TableError, TableOps, TableResult,
};
use tempfile::TempDir;

static TRACING: std::sync::Once = std::sync::Once::new();

/// Install a test-writer subscriber once, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Worker plus option store over one temporary database file.
#[allow(dead_code)]
pub struct TestDb {
    pub worker: Arc<SqliteWorker>,
    pub options: Arc<SqliteOptionStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestDb {
    pub async fn with_context(ctx: HostContext) -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("create temp dir");
        let worker = SqliteWorker::open(temp_dir.path().join("tables.db"), ctx)
            .await
            .expect("open worker database");
        let options = SqliteOptionStore::new(worker.pool().clone())
            .await
            .expect("create option store");
        Self {
            worker: Arc::new(worker),
            options: Arc::new(options),
            _temp_dir: temp_dir,
        }
    }

    pub async fn new() -> Self {
        Self::with_context(debug_context()).await
    }
}

/// Context with both debug switches on and fixed table prefixes.
#[allow(dead_code)]
pub fn debug_context() -> HostContext {
    let mut ctx = HostContext::new("app_", "app_1_");
    ctx.debug = true;
    ctx.debug_log = true;
    ctx
}

/// Logger that records every emitted message.
#[allow(dead_code)]
#[derive(Default)]
pub struct CapturingLogger {
    messages: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger(&self) -> Logger {
        let sink = self.messages.clone();
        Logger::custom(move |message| sink.lock().unwrap().push(message.to_string()))
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

/// Worker whose create always fails, for exercising failure paths.
#[allow(dead_code)]
pub struct FailingWorker;

#[async_trait]
impl TableOps for FailingWorker {
    async fn create_table(
        &self,
        _table: &str,
        _schema_fragment: &str,
        _logger: &Logger,
    ) -> TableResult<()> {
        Err(TableError::Query("simulated create failure".to_string()))
    }

    async fn table_exists(&self, _table: &str) -> TableResult<bool> {
        Ok(false)
    }

    async fn delete_table(&self, _table: &str, _logger: &Logger) -> TableResult<()> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    async fn reinit_table(&self, _table: &str) -> TableResult<()> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    async fn empty_table(&self, _table: &str) -> TableResult<u64> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    async fn clone_table(&self, _table: &str, _new_table: &str) -> TableResult<()> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    async fn copy_table(&self, _table: &str, _new_table: &str) -> TableResult<u64> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    async fn count_table_rows(&self, _table: &str, _column: &str) -> TableResult<u64> {
        Err(TableError::Query("simulated failure".to_string()))
    }

    fn last_error(&self) -> String {
        "simulated create failure".to_string()
    }
}
