//! Integration tests for the version-gated table upgrader.

mod common;

use common::{debug_context, FailingWorker, TestDb};
use std::sync::{Arc, Mutex};
use tablekit::{
    HookBus, HostContext, OptionScope, OptionStore, StaticTableDefinition, TableDefinition,
    TableOps, TableRegistry, TableUpgrader, UpgraderConfig,
};

const ITEMS_SCHEMA: &str =
    "id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, qty INTEGER NOT NULL DEFAULT 0";

fn items_definition() -> Arc<dyn TableDefinition> {
    Arc::new(StaticTableDefinition::new("items", 2, ITEMS_SCHEMA).with_primary_key("id"))
}

async fn upgrader_for(
    db: &TestDb,
    definition: Arc<dyn TableDefinition>,
    ctx: HostContext,
    config: UpgraderConfig,
) -> (Arc<TableUpgrader>, Arc<Mutex<TableRegistry>>) {
    let registry = Arc::new(Mutex::new(TableRegistry::new()));
    let upgrader = TableUpgrader::new(
        definition,
        db.worker.clone() as Arc<dyn TableOps>,
        db.options.clone() as Arc<dyn OptionStore>,
        registry.clone(),
        ctx,
        config,
    )
    .await
    .expect("build upgrader");
    (upgrader, registry)
}

#[tokio::test]
async fn test_new_marks_ready_when_stored_version_matches() {
    let db = TestDb::new().await;
    db.options
        .set_int("items_db_version", 2, OptionScope::Site)
        .await
        .unwrap();

    let (upgrader, registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;

    assert!(upgrader.table_is_ready());
    assert!(upgrader.table_is_up_to_date().await.unwrap());
    assert_eq!(
        registry.lock().unwrap().full_name("items"),
        Some("app_1_items")
    );
    // The schema itself is untouched until an upgrade actually runs.
    assert!(!db.worker.table_exists("app_1_items").await.unwrap());
}

#[tokio::test]
async fn test_maybe_upgrade_creates_missing_table() {
    let db = TestDb::new().await;
    let (upgrader, registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;

    assert!(!upgrader.table_is_ready());
    assert_eq!(upgrader.db_version().await.unwrap(), 0);

    upgrader.maybe_upgrade_table().await.unwrap();

    assert!(upgrader.table_is_ready());
    assert_eq!(upgrader.db_version().await.unwrap(), 2);
    assert!(db.worker.table_exists("app_1_items").await.unwrap());
    let registry = registry.lock().unwrap();
    assert_eq!(registry.full_name("items"), Some("app_1_items"));
    assert_eq!(registry.local_tables().collect::<Vec<_>>(), ["items"]);
}

#[tokio::test]
async fn test_maybe_upgrade_from_stale_version() {
    let db = TestDb::new().await;
    db.options
        .set_int("items_db_version", 1, OptionScope::Site)
        .await
        .unwrap();

    let (upgrader, _registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;
    assert!(!upgrader.table_is_ready());

    upgrader.maybe_upgrade_table().await.unwrap();

    assert!(upgrader.table_is_ready());
    assert_eq!(upgrader.db_version().await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_create_clears_version_and_registration() {
    let db = TestDb::new().await;
    db.options
        .set_int("items_db_version", 1, OptionScope::Site)
        .await
        .unwrap();

    let registry = Arc::new(Mutex::new(TableRegistry::new()));
    let upgrader = TableUpgrader::new(
        items_definition(),
        Arc::new(FailingWorker),
        db.options.clone() as Arc<dyn OptionStore>,
        registry.clone(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await
    .unwrap();

    // The create error surfaces only after readiness and the stored
    // version have been cleared.
    assert!(upgrader.maybe_upgrade_table().await.is_err());

    assert!(!upgrader.table_is_ready());
    assert_eq!(upgrader.db_version().await.unwrap(), 0);
    assert!(!registry.lock().unwrap().is_registered("items"));
}

#[tokio::test]
async fn test_init_defers_upgrade_to_hook_dispatch() {
    let db = TestDb::new().await;
    let (upgrader, _registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;

    let hooks = HookBus::new();
    upgrader.init(&hooks);

    hooks.dispatch("shutdown").await;
    assert!(!upgrader.table_is_ready());
    assert!(!db.worker.table_exists("app_1_items").await.unwrap());

    hooks.dispatch("startup").await;
    assert!(upgrader.table_is_ready());
    assert!(db.worker.table_exists("app_1_items").await.unwrap());
}

#[tokio::test]
async fn test_empty_hook_disables_scheduling() {
    let db = TestDb::new().await;
    let config = UpgraderConfig {
        upgrade_hook: String::new(),
        ..UpgraderConfig::default()
    };
    let (upgrader, _registry) = upgrader_for(&db, items_definition(), debug_context(), config).await;

    let hooks = HookBus::new();
    upgrader.init(&hooks);
    hooks.dispatch("startup").await;

    assert!(!upgrader.table_is_ready());
    assert!(!db.worker.table_exists("app_1_items").await.unwrap());
}

#[tokio::test]
async fn test_global_table_on_multisite_uses_network_scope() {
    let mut ctx = debug_context();
    ctx.multisite = true;
    let db = TestDb::with_context(ctx.clone()).await;
    let definition: Arc<dyn TableDefinition> = Arc::new(
        StaticTableDefinition::new("logs", 4, ITEMS_SCHEMA)
            .global(true)
            .with_primary_key("id"),
    );

    let (upgrader, registry) = upgrader_for(&db, definition, ctx, UpgraderConfig::default()).await;
    upgrader.maybe_upgrade_table().await.unwrap();

    assert!(db.worker.table_exists("app_logs").await.unwrap());
    assert_eq!(
        db.options
            .get_int("logs_db_version", OptionScope::Network)
            .await
            .unwrap(),
        4
    );
    assert_eq!(
        db.options
            .get_int("logs_db_version", OptionScope::Site)
            .await
            .unwrap(),
        0
    );
    let registry = registry.lock().unwrap();
    assert_eq!(registry.global_tables().collect::<Vec<_>>(), ["logs"]);
    assert_eq!(registry.full_name("logs"), Some("app_logs"));
}

#[tokio::test]
async fn test_db_version_option_name() {
    let db = TestDb::new().await;
    let (upgrader, _registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;
    assert_eq!(upgrader.db_version_option_name(), "items_db_version");
}

#[tokio::test]
async fn test_handle_downgrade_version_comparison() {
    let db = TestDb::new().await;
    db.options
        .set_int("items_db_version", 5, OptionScope::Site)
        .await
        .unwrap();

    // Without downgrade handling a newer stored version counts as current.
    let (upgrader, _registry) = upgrader_for(
        &db,
        items_definition(),
        debug_context(),
        UpgraderConfig::default(),
    )
    .await;
    assert!(upgrader.table_is_up_to_date().await.unwrap());

    // With downgrade handling, any stored version other than the declared
    // one counts as current; only an exact match triggers a re-run.
    let config = UpgraderConfig {
        handle_downgrade: true,
        ..UpgraderConfig::default()
    };
    let (upgrader, _registry) =
        upgrader_for(&db, items_definition(), debug_context(), config.clone()).await;
    assert!(upgrader.table_is_up_to_date().await.unwrap());

    db.options
        .set_int("items_db_version", 2, OptionScope::Site)
        .await
        .unwrap();
    let (upgrader, _registry) =
        upgrader_for(&db, items_definition(), debug_context(), config).await;
    assert!(!upgrader.table_is_up_to_date().await.unwrap());

    upgrader.maybe_upgrade_table().await.unwrap();
    assert_eq!(upgrader.db_version().await.unwrap(), 2);
    assert!(db.worker.table_exists("app_1_items").await.unwrap());
}
