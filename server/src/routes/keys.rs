use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::key_handlers::{create_key, delete_key, list_keys};

pub fn key_routes() -> Router {
    Router::new()
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/{id}", delete(delete_key))
}
