//! Custom database table management: creation, versioning, and upgrades.
//!
//! This crate provides the building blocks for applications that own
//! their tables:
//! - Table definitions with a declared schema version
//! - A table worker for DDL and maintenance operations
//! - A version-gated upgrader that creates or upgrades tables and
//!   persists the outcome
//! - Identifier sanitizing and value quoting helpers
//! - A known-tables registry and scoped option storage

pub mod context;
pub mod definition;
pub mod error;
pub mod hooks;
pub mod ident;
pub mod logging;
pub mod options;
pub mod registry;
pub mod schema;
pub mod sqlite;
pub mod upgrader;
pub mod worker;

pub use context::{HostContext, LogFilter};
pub use definition::{full_table_name, StaticTableDefinition, TableDefinition, TableSnapshot};
pub use error::{TableError, TableResult};
pub use hooks::{HookBus, HookCallback, HookFuture, LifecycleHooks};
pub use ident::{
    prepare_values_list, quote_ident, quote_value, sanitize_table_name, Value,
};
pub use logging::Logger;
pub use options::{OptionScope, OptionStore, SqliteOptionStore};
pub use registry::TableRegistry;
pub use sqlite::SqliteWorker;
pub use upgrader::{TableUpgrader, UpgraderConfig, TABLE_VERSION_OPTION_SUFFIX};
pub use worker::TableOps;
