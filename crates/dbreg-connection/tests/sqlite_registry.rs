//! Integration tests for the registry over the bundled SQLite driver

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dbreg_connection::{
    ClusterOpener, Configs, ConnectionConfig, Database, DbRegError, PoolConfig, Registry,
};
use dbreg_core::Value;
use pretty_assertions::assert_eq;

/// Initialize logging for tests if not already initialized
fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("dbreg_connection=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn path_of(dir: &Path, file: &str) -> String {
    dir.join(file).to_str().unwrap().to_string()
}

fn single(name: &str, config: ConnectionConfig) -> Configs {
    Configs::from([(name.to_string(), config)])
}

#[tokio::test]
async fn test_default_connection_round_trip() {
    initialize_logging();
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::new(single(
        "default",
        ConnectionConfig::new("sqlite", [path_of(dir.path(), "app.db")]).with_max_open_conns(4),
    ));

    assert_eq!(registry.default_driver().await.unwrap(), "sqlite");
    let db = registry.default_connection().await.unwrap();
    assert_eq!(db.driver_name(), "sqlite");
    assert!(dir.path().join("app.db").exists());

    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .await
        .unwrap();
    let inserted = db
        .execute(
            "INSERT INTO users (name) VALUES (?1), (?2)",
            &[Value::from("ada"), Value::from("grace")],
        )
        .await
        .unwrap();
    assert_eq!(inserted.affected_rows, 2);

    let result = db
        .query("SELECT name FROM users ORDER BY id", &[])
        .await
        .unwrap();
    let names: Vec<&str> = result
        .rows
        .iter()
        .filter_map(|row| row.get_by_name("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["ada", "grace"]);

    let again = registry.connection("default").await.unwrap();
    assert!(Arc::ptr_eq(&db, &again));
}

#[tokio::test]
async fn test_configs_from_json() {
    initialize_logging();
    let dir = tempfile::tempdir().unwrap();
    let json = serde_json::json!({
        "default": {
            "nodes": [path_of(dir.path(), "primary.db"), path_of(dir.path(), "replica.db")],
            "driver": "sqlite",
            "max_open_conns": 2,
            "max_idle_conns": 1,
            "conn_max_lifetime_ms": 60000
        }
    });
    let configs: Configs = serde_json::from_value(json).unwrap();
    let registry = Registry::new(configs);

    let db = registry.default_connection().await.unwrap();

    // Writes land on the primary only; reads go to the replica
    db.execute("CREATE TABLE t (id INTEGER)", &[]).await.unwrap();
    let err = db.query("SELECT id FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, DbRegError::Query(_)));

    registry.close().await.unwrap();
    assert!(db.is_closed());
    assert!(registry.open_names().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_node_is_not_cached() {
    initialize_logging();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing").join("app.db");
    let registry = Registry::new(single(
        "default",
        ConnectionConfig::new("sqlite", [missing.to_str().unwrap()]),
    ));

    let err = registry.default_connection().await.err().expect("probe fails");
    assert!(matches!(err, DbRegError::Connection(_)));
    assert!(!registry.is_open("default").await);

    // Once the directory exists the same name opens normally
    std::fs::create_dir(dir.path().join("missing")).unwrap();
    registry.default_connection().await.unwrap();
    assert!(registry.is_open("default").await);
}

#[tokio::test]
async fn test_unknown_driver_is_reported() {
    initialize_logging();
    let registry = Registry::new(single(
        "default",
        ConnectionConfig::new("oracle", ["db.example:1521"]),
    ));

    let err = registry.default_connection().await.err().expect("no such driver");
    assert!(matches!(err, DbRegError::UnknownDriver(name) if name == "oracle"));
    assert_eq!(registry.driver("default").await.unwrap(), "oracle");
}

#[tokio::test]
async fn test_after_open_sees_live_handle() {
    initialize_logging();
    let dir = tempfile::tempdir().unwrap();
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);

    let config = ConnectionConfig::new("sqlite", [path_of(dir.path(), "hooks.db")])
        .with_conn_max_lifetime(Duration::from_secs(300))
        .with_after_open(move |name: &str, db: &Arc<dyn Database>| {
            assert_eq!(name, "analytics");
            assert!(!db.is_closed());
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let registry = Registry::new(single("analytics", config));

    registry.connection("analytics").await.unwrap();
    registry.connection("analytics").await.unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    registry.close().await.unwrap();
    registry.connection("analytics").await.unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_custom_opener_pool_defaults() {
    initialize_logging();
    let dir = tempfile::tempdir().unwrap();
    let opener = ClusterOpener::default().with_pool_config(PoolConfig::new(1, 1));
    let registry = Registry::with_opener(
        single(
            "default",
            ConnectionConfig::new("sqlite", [path_of(dir.path(), "one.db")]).with_max_idle_conns(1),
        ),
        Arc::new(opener),
    );

    let db = registry.default_connection().await.unwrap();
    db.execute("CREATE TABLE t (id INTEGER)", &[]).await.unwrap();
    db.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    let rows = db.query("SELECT COUNT(*) AS n FROM t", &[]).await.unwrap();
    assert_eq!(rows.rows[0].get(0), Some(&Value::Int64(1)));
}
