use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod app;
mod error;
mod http;
mod identity;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medsched_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > MEDSCHED_CONFIG env > ~/.medsched/medsched.toml
    let config_path = std::env::var("MEDSCHED_CONFIG").ok();
    let config = medsched_core::config::MedschedConfig::load(config_path.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            medsched_core::config::MedschedConfig::default()
        });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    // Request handling and the reminder engine each get their own
    // connection; schema init is idempotent so both may run it.
    let store = medsched_store::Store::new(open_db(&db_path)?)?;
    let reminder_store = medsched_store::Store::new(open_db(&db_path)?)?;
    info!("database migrations complete");

    let period = std::time::Duration::from_secs(config.reminder.period_secs);
    let engine = medsched_reminder::ReminderEngine::new(
        reminder_store,
        Box::new(medsched_reminder::TracingNotifier),
        period,
    );

    let state = Arc::new(app::AppState::new(config, store));
    let router = app::build_router(state);

    // spawn reminder engine loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { engine.run(shutdown_rx).await });

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Medsched gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal reminder engine to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

fn open_db(path: &str) -> anyhow::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
