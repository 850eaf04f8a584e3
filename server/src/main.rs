mod handlers;
mod models;
mod routes;
mod state;

use std::env;
use std::path::PathBuf;

use archiver_service_cli::ArchiveConfig;
use axum::{
    http::{header, HeaderValue, Method},
    Extension, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use routes::{archive::archive_routes, keys::key_routes};
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client_url = env::var("CLIENT_URL").expect("CLIENT_URL must be set");
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let output_dir = PathBuf::from(env::var("OUTPUT_DIR").unwrap_or_else(|_| "arquivos".to_string()));

    let cors = CorsLayer::new()
        .allow_origin(client_url.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::POST, Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let state = AppState::new(ArchiveConfig::default(), output_dir.clone());

    let app = Router::new()
        .nest("/api", archive_routes())
        .nest("/api", key_routes())
        .nest_service("/archives", ServeDir::new(&output_dir))
        .layer(Extension(state))
        .layer(cors);

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    tracing::info!("Servidor a correr em {}", addr);
    axum::serve(listener, app).await.unwrap();
}
