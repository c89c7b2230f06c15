use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite};
use tokio::time::{self, Duration as TokioDuration};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medicalmap::{config, db, mailer::Mailer, middleware, routes, state::AppState, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (stdout + tägliche Datei-Rotation unter ./logs)
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "medicalmap.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Guards am Leben halten, damit die Non-Blocking Writer korrekt flushen
    let _log_guards = (stdout_guard, file_guard);

    // Load configuration (embedded defaults -> medicalmap.toml -> env/.env)
    let app_cfg = config::load()?;

    // The sqlite backend needs the pool; the snapshot backend runs without it.
    let pool = if app_cfg.data.backend == "sqlite" {
        let db_url = &app_cfg.database.url;
        config::ensure_sqlite_parent_dir(db_url)?;
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating SQLite database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    let _ = sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await;
                    let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                    Ok(())
                })
            })
            .connect(db_url)
            .await?;
        db::init_db(&pool).await?;
        Some(pool)
    } else {
        None
    };

    let record_store = store::build_store(&app_cfg, pool.clone())?;

    let mailer = Mailer::from_config(&app_cfg.email);
    if mailer.is_none() {
        tracing::warn!("Email delivery not configured; POST /v1/exports will return 500");
    }

    // App state (includes rate limiting)
    let state = AppState::new(record_store, pool, app_cfg.clone(), mailer);

    // Spawn periodic cleanup for per-endpoint rate limiters to avoid memory growth
    {
        let rl = state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(TokioDuration::from_secs(300));
            loop {
                ticker.tick().await;
                rl.cleanup_all().await;
            }
        });
    }

    // CORS: nur die konfigurierten Origins, wie im Frontend-Deployment hinterlegt
    let origins: Vec<HeaderValue> = app_cfg
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // Clone config Arc for stateful middleware
    let cfg_arc = state.config.clone();

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/version", get(routes::health::version))
        .route("/v1/congresses", get(routes::congresses::list_congresses))
        .route("/v1/exports", post(routes::exports::create_export))
        .with_state(state)
        // Globales Body-Limit (1 MB) – Export-Bodies sind klein
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg_arc, middleware::security_headers::security_headers_middleware))
        .layer(cors);

    // Server listen addr (from config)
    let port: u16 = app_cfg.server.port;
    let host: String = app_cfg.server.host.clone();
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("MedicalMap listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
