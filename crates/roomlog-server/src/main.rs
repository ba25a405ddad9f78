use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use roomlog_api::storage::Storage;
use roomlog_api::{AppState, AppStateInner, entries, timesheets};

/// Generous cap for one multipart body: up to 10 images plus form fields.
const MAX_UPLOAD_BODY: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomlog=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("ROOMLOG_DB_PATH").unwrap_or_else(|_| "roomlog.db".into());
    let upload_dir = std::env::var("ROOMLOG_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into());
    let host = std::env::var("ROOMLOG_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROOMLOG_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and image store
    let db = roomlog_db::Database::open(&PathBuf::from(&db_path))?;
    let storage = Storage::new(PathBuf::from(&upload_dir)).await?;

    let state: AppState = Arc::new(AppStateInner { db, storage });

    // Routes
    let entry_routes = Router::new()
        .route("/submit-data", post(entries::submit))
        .route("/get-data", get(entries::search))
        .route("/update-data", post(entries::update))
        .route("/delete-data", post(entries::delete))
        .route("/add-image", post(entries::add_images))
        .route("/delete-image", post(entries::delete_image));

    let timesheet_routes = Router::new()
        .route("/timesheets/{entry_id}", get(timesheets::list))
        .route(
            "/timesheets/get-current-row/{entry_id}",
            get(timesheets::get_current_row),
        )
        .route("/timesheets/newRow", post(timesheets::new_row))
        .route("/timesheets/signIn", post(timesheets::sign_in))
        .route("/timesheets/signOut", post(timesheets::sign_out))
        .route("/timesheets/updateRow", post(timesheets::update_row))
        .route("/timesheets/deleteRow", delete(timesheets::delete_row));

    let app = Router::new()
        .merge(entry_routes)
        .merge(timesheet_routes)
        .route("/health", get(health))
        .with_state(state)
        .nest_service("/uploads", ServeDir::new(&upload_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("roomlog server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
