//! Table definition contract and diagnostics snapshot.

use crate::context::HostContext;
use crate::error::{TableError, TableResult};
use crate::ident;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Immutable description of one managed table.
pub trait TableDefinition: Send + Sync {
    /// Declared schema version; bump it whenever `table_schema` changes.
    fn table_version(&self) -> i64;

    /// Unprefixed table name.
    fn table_short_name(&self) -> &str;

    /// Whether the table is shared network-wide rather than per-site.
    fn is_table_global(&self) -> bool;

    /// Primary key column specification.
    fn primary_key(&self) -> &str;

    /// Column name to bind-placeholder map.
    fn column_placeholders(&self) -> &BTreeMap<String, String>;

    /// Column name to default value map.
    fn column_defaults(&self) -> &BTreeMap<String, JsonValue>;

    /// Column/key DDL fragment, without the surrounding `CREATE TABLE`.
    fn table_schema(&self) -> &str;
}

/// Full (prefixed) table name for a definition: the global or per-site
/// prefix followed by the sanitized short name.
pub fn full_table_name(def: &dyn TableDefinition, ctx: &HostContext) -> TableResult<String> {
    let prefix = if def.is_table_global() {
        &ctx.base_prefix
    } else {
        &ctx.site_prefix
    };
    let short = ident::sanitize_table_name(def.table_short_name())
        .ok_or_else(|| TableError::InvalidIdentifier(def.table_short_name().to_string()))?;
    Ok(format!("{prefix}{short}"))
}

/// Table definition backed by plain owned data.
#[derive(Debug, Clone)]
pub struct StaticTableDefinition {
    short_name: String,
    version: i64,
    global: bool,
    primary_key: String,
    column_placeholders: BTreeMap<String, String>,
    column_defaults: BTreeMap<String, JsonValue>,
    schema: String,
}

impl StaticTableDefinition {
    pub fn new(short_name: impl Into<String>, version: i64, schema: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            version,
            global: false,
            primary_key: String::new(),
            column_placeholders: BTreeMap::new(),
            column_defaults: BTreeMap::new(),
            schema: schema.into(),
        }
    }

    /// Mark the table as network-wide.
    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_column_placeholder(
        mut self,
        column: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        self.column_placeholders
            .insert(column.into(), placeholder.into());
        self
    }

    pub fn with_column_default(mut self, column: impl Into<String>, default: JsonValue) -> Self {
        self.column_defaults.insert(column.into(), default);
        self
    }
}

impl TableDefinition for StaticTableDefinition {
    fn table_version(&self) -> i64 {
        self.version
    }

    fn table_short_name(&self) -> &str {
        &self.short_name
    }

    fn is_table_global(&self) -> bool {
        self.global
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn column_placeholders(&self) -> &BTreeMap<String, String> {
        &self.column_placeholders
    }

    fn column_defaults(&self) -> &BTreeMap<String, JsonValue> {
        &self.column_defaults
    }

    fn table_schema(&self) -> &str {
        &self.schema
    }
}

/// Serializable attribute snapshot of a definition, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub table_version: i64,
    pub table_short_name: String,
    pub table_name: String,
    pub table_is_global: bool,
    pub primary_key: String,
    pub column_placeholders: BTreeMap<String, String>,
    pub column_defaults: BTreeMap<String, JsonValue>,
    pub table_schema: String,
}

impl TableSnapshot {
    pub fn of(def: &dyn TableDefinition, ctx: &HostContext) -> TableResult<Self> {
        Ok(Self {
            table_version: def.table_version(),
            table_short_name: def.table_short_name().to_string(),
            table_name: full_table_name(def, ctx)?,
            table_is_global: def.is_table_global(),
            primary_key: def.primary_key().to_string(),
            column_placeholders: def.column_placeholders().clone(),
            column_defaults: def.column_defaults().clone(),
            table_schema: def.table_schema().to_string(),
        })
    }

    /// JSON rendering; empty string when serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
