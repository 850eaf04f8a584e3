use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateKeyPayload {
    pub alias: String,
    pub key: String,
}

pub async fn list_keys(Extension(state): Extension<AppState>) -> impl IntoResponse {
    Json(state.list_keys())
}

pub async fn create_key(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateKeyPayload>,
) -> impl IntoResponse {
    if payload.alias.trim().is_empty() || payload.key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Alias e chave são obrigatórios." })),
        );
    }

    let saved = state.save_key(payload.alias.trim().to_string(), payload.key);
    (StatusCode::OK, Json(json!(saved)))
}

pub async fn delete_key(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.delete_key(&id) {
        (StatusCode::OK, Json(json!({ "message": "Chave removida." })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Chave não encontrada." })),
        )
    }
}
