use foodbiz_server::api;
use foodbiz_server::config::Config;
use foodbiz_server::db::{self, BootstrapOptions};
use foodbiz_server::logger::init_logger;
use foodbiz_server::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger(&config.log);

    tracing::info!("Starting foodbiz-server (env: {})", config.environment);
    if config.reset_db_on_startup && config.is_production() {
        return Err("RESET_DB_ON_STARTUP is not allowed in production".into());
    }

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;
    let options = BootstrapOptions {
        reset: config.reset_db_on_startup,
        seed_demo: config.seed_demo_data,
    };
    let (database, report) = match db::bootstrap(pool, options).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Database bootstrap failed");
            return Err(e.into());
        }
    };
    for table in &report.tables {
        if !table.skipped && (!table.added.is_empty() || table.rows_backfilled > 0) {
            tracing::info!(
                table = table.table,
                added = ?table.added,
                rows_backfilled = table.rows_backfilled,
                "Schema migrated"
            );
        }
    }

    let state = AppState::new(&config, database);
    let app = api::create_router(state, &config.allowed_origins);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("foodbiz-server HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("foodbiz-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
