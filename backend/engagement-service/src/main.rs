use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use engagement_service::config::{Config, StorageBackend};
use engagement_service::handlers::{self, AppState};
use engagement_service::repository::{MemoryStore, PgStore};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,engagement_service=debug,sqlx=warn"));

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Readiness reflects the database when postgres is the backend.
async fn ready(pg: web::Data<Option<PgStore>>) -> HttpResponse {
    match pg.get_ref() {
        None => HttpResponse::Ok().json(serde_json::json!({ "status": "ready" })),
        Some(store) => match store.health_check().await {
            Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "ready" })),
            Err(e) => {
                warn!("Readiness check failed: {}", e);
                HttpResponse::ServiceUnavailable()
                    .json(serde_json::json!({ "status": "unavailable" }))
            }
        },
    }
}

async fn connect(config: &Config) -> Result<PgStore> {
    let database = config
        .database
        .as_ref()
        .context("postgres backend selected without database configuration")?;

    let connect_options = PgConnectOptions::from_str(&database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0);

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;
    info!("Database pool created");

    let store = PgStore::new(pool);
    store.migrate().await.context("Failed to run migrations")?;
    info!("Database migrations applied");
    Ok(store)
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting engagement-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: env={}, http_port={}, storage={:?}, timeout_ms={}",
        config.app.env, config.app.http_port, config.storage.backend, config.storage.timeout_ms
    );

    let (state, pg) = match config.storage.backend {
        StorageBackend::Postgres => {
            let store = connect(&config).await?;
            let state = AppState::new(Arc::new(store.clone()), &config);
            (state, Some(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart and not shared across replicas");
            (AppState::new(Arc::new(MemoryStore::new()), &config), None)
        }
    };

    let state = web::Data::new(state);
    let pg = web::Data::new(pg);
    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("HTTP server listening on http://{}", http_addr);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .app_data(pg.clone())
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .disable_signals()
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, draining connections");
        handle.stop(true).await;
    });

    if let Err(e) = server.await {
        error!("HTTP server error: {}", e);
        return Err(e.into());
    }

    info!("engagement-service stopped");
    Ok(())
}
