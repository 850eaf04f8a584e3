use axum::routing::post;
use axum::Router;

use crate::handlers::archive_handler::process_archive;

pub fn archive_routes() -> Router {
    Router::new().route("/process", post(process_archive))
}
