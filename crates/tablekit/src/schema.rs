//! Additive schema migration.
//!
//! The migrator receives the column/key fragment of a `CREATE TABLE`
//! statement and reconciles it against the live database: it creates the
//! table when absent, and adds missing columns when present. It never
//! drops or renames existing columns.

use crate::error::{TableError, TableResult};
use crate::ident::quote_ident;
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;

/// Create or additively upgrade `table` to match `schema_fragment`.
///
/// The fragment is the comma-separated list of column definitions and
/// table constraints that would sit inside `CREATE TABLE <name> (...)`.
/// A fragment that declares no primary key is rejected.
pub async fn apply_table_schema(
    pool: &Pool<Sqlite>,
    table: &str,
    schema_fragment: &str,
) -> TableResult<()> {
    if !declares_primary_key(schema_fragment) {
        return Err(TableError::Query(format!(
            "schema for table {table} declares no primary key"
        )));
    }

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;

    if !exists {
        let sql = format!("CREATE TABLE {} ({})", quote_ident(table), schema_fragment);
        sqlx::query(&sql).execute(pool).await?;
        tracing::debug!(table, "created table");
        return Ok(());
    }

    // SQLite can't ALTER existing column types or constraints; the only
    // reconciliation available is adding columns that the live table lacks.
    let columns: Vec<(i32, String, String, i32, Option<String>, i32)> =
        sqlx::query_as(&format!("PRAGMA table_info({})", quote_ident(table)))
            .fetch_all(pool)
            .await?;
    let existing: HashSet<String> = columns.into_iter().map(|(_, name, _, _, _, _)| name).collect();

    for definition in split_definitions(schema_fragment) {
        if is_table_constraint(&definition) {
            continue;
        }
        let Some(column) = column_name(&definition) else {
            continue;
        };
        if existing.contains(&column) {
            continue;
        }

        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            definition
        );
        sqlx::query(&sql).execute(pool).await?;
        tracing::debug!(table, column = %column, "added missing column");
    }

    Ok(())
}

/// Split a schema fragment on top-level commas, respecting parentheses
/// and single-quoted strings.
fn split_definitions(fragment: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    for ch in fragment.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '(' if !in_string => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_string => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_string && depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Whether the fragment declares a primary key, inline or as a table
/// constraint.
fn declares_primary_key(fragment: &str) -> bool {
    let normalized = fragment
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    normalized.contains("primary key")
}

/// Whether a definition line is a table constraint rather than a column.
fn is_table_constraint(definition: &str) -> bool {
    let Some(first) = definition.split_whitespace().next() else {
        return false;
    };
    matches!(
        first.to_ascii_uppercase().as_str(),
        "PRIMARY" | "UNIQUE" | "CHECK" | "FOREIGN" | "CONSTRAINT"
    )
}

/// First token of a column definition, unquoted.
fn column_name(definition: &str) -> Option<String> {
    definition
        .split_whitespace()
        .next()
        .map(|token| token.trim_matches(|c| c == '"' || c == '`').to_string())
}
