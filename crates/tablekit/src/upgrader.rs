//! Version-gated table creation and upgrade.

use crate::context::HostContext;
use crate::definition::{self, TableDefinition};
use crate::error::TableResult;
use crate::hooks::{HookCallback, LifecycleHooks};
use crate::logging::Logger;
use crate::options::{OptionScope, OptionStore};
use crate::registry::TableRegistry;
use crate::worker::TableOps;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Suffix of the option key that stores a table's version.
pub const TABLE_VERSION_OPTION_SUFFIX: &str = "_db_version";

/// Upgrader behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgraderConfig {
    /// Also re-run creation when the stored version is newer than the
    /// declared one.
    #[serde(default)]
    pub handle_downgrade: bool,
    /// Lifecycle event that triggers the upgrade check; an empty string
    /// disables automatic scheduling.
    #[serde(default = "default_upgrade_hook")]
    pub upgrade_hook: String,
    /// Priority on the upgrade hook.
    #[serde(default = "default_upgrade_hook_prio")]
    pub upgrade_hook_prio: i32,
}

impl Default for UpgraderConfig {
    fn default() -> Self {
        Self {
            handle_downgrade: false,
            upgrade_hook: default_upgrade_hook(),
            upgrade_hook_prio: default_upgrade_hook_prio(),
        }
    }
}

fn default_upgrade_hook() -> String {
    "startup".to_string()
}

fn default_upgrade_hook_prio() -> i32 {
    8
}

/// Creates or upgrades one table when its stored version no longer
/// satisfies the declared one, persisting the outcome as an option.
pub struct TableUpgrader {
    table: Arc<dyn TableDefinition>,
    worker: Arc<dyn TableOps>,
    options: Arc<dyn OptionStore>,
    registry: Arc<Mutex<TableRegistry>>,
    ctx: HostContext,
    config: UpgraderConfig,
    table_ready: AtomicBool,
}

impl TableUpgrader {
    /// Build an upgrader and settle initial readiness from the stored
    /// version. A table already at its declared version is marked ready
    /// (and registered) without touching the database schema.
    pub async fn new(
        table: Arc<dyn TableDefinition>,
        worker: Arc<dyn TableOps>,
        options: Arc<dyn OptionStore>,
        registry: Arc<Mutex<TableRegistry>>,
        ctx: HostContext,
        config: UpgraderConfig,
    ) -> TableResult<Arc<Self>> {
        let upgrader = Arc::new(Self {
            table,
            worker,
            options,
            registry,
            ctx,
            config,
            table_ready: AtomicBool::new(false),
        });

        if upgrader.table_is_up_to_date().await? {
            upgrader.mark_ready()?;
        }

        Ok(upgrader)
    }

    /// Register the deferred upgrade check on the configured hook.
    pub fn init(self: &Arc<Self>, hooks: &dyn LifecycleHooks) {
        if self.config.upgrade_hook.is_empty() {
            return;
        }

        let upgrader = Arc::clone(self);
        let callback: HookCallback = Arc::new(move || {
            let upgrader = Arc::clone(&upgrader);
            Box::pin(async move {
                if let Err(err) = upgrader.maybe_upgrade_table().await {
                    tracing::error!(
                        table = upgrader.table.table_short_name(),
                        "table upgrade check failed: {err}"
                    );
                }
            })
        });
        hooks.register(
            &self.config.upgrade_hook,
            self.config.upgrade_hook_prio,
            callback,
        );
    }

    /// Whether the table is ready to be used.
    pub fn table_is_ready(&self) -> bool {
        self.table_ready.load(Ordering::SeqCst)
    }

    /// Whether the stored version satisfies the declared one.
    pub async fn table_is_up_to_date(&self) -> TableResult<bool> {
        let stored = self.db_version().await?;
        if stored == 0 {
            return Ok(false);
        }

        if self.config.handle_downgrade {
            return Ok(stored != self.table.table_version());
        }
        Ok(stored >= self.table.table_version())
    }

    /// Stored version for this table; 0 when never created.
    pub async fn db_version(&self) -> TableResult<i64> {
        self.options
            .get_int(&self.db_version_option_name(), self.option_scope())
            .await
    }

    /// Option key that stores the table version.
    pub fn db_version_option_name(&self) -> String {
        format!(
            "{}{TABLE_VERSION_OPTION_SUFFIX}",
            self.table.table_short_name()
        )
    }

    /// Run the upgrade check: mark ready when up to date, otherwise
    /// create/upgrade the table.
    pub async fn maybe_upgrade_table(&self) -> TableResult<()> {
        if self.table_is_up_to_date().await? {
            self.mark_ready()?;
            return Ok(());
        }

        self.upgrade_table().await
    }

    /// Create/upgrade the table and record the outcome. A create failure
    /// clears the stored version so the next check is not short-circuited
    /// by `table_is_up_to_date`, then propagates the error.
    pub async fn upgrade_table(&self) -> TableResult<()> {
        let name = definition::full_table_name(self.table.as_ref(), &self.ctx)?;
        let created = self
            .worker
            .create_table(&name, self.table.table_schema(), &Logger::Default)
            .await;

        match created {
            Err(err) => {
                self.mark_not_ready();
                self.options
                    .delete(&self.db_version_option_name(), self.option_scope())
                    .await?;
                Err(err)
            }
            Ok(()) => {
                self.mark_ready()?;
                self.options
                    .set_int(
                        &self.db_version_option_name(),
                        self.table.table_version(),
                        self.option_scope(),
                    )
                    .await?;
                Ok(())
            }
        }
    }

    fn option_scope(&self) -> OptionScope {
        if self.table.is_table_global() && self.ctx.multisite {
            OptionScope::Network
        } else {
            OptionScope::Site
        }
    }

    fn mark_ready(&self) -> TableResult<()> {
        let short = self.table.table_short_name();
        let full = definition::full_table_name(self.table.as_ref(), &self.ctx)?;

        self.table_ready.store(true, Ordering::SeqCst);
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        if self.table.is_table_global() {
            registry.register_global(short, &full);
        } else {
            registry.register_local(short, &full);
        }
        Ok(())
    }

    fn mark_not_ready(&self) {
        self.table_ready.store(false, Ordering::SeqCst);
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.unregister(self.table.table_short_name());
    }
}
