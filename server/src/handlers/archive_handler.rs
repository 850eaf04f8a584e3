use std::sync::{Arc, Mutex};

use archiver_service_cli::{
    ai::ContentCleaner, archiver::Archiver, error::ArchiveError, proxy::ProxyFetcher,
    ArchiveRequest,
};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessPayload {
    pub url: String,
    #[serde(rename = "folderName")]
    pub folder_name: String,
    #[serde(rename = "keyPayload")]
    pub key_payload: Option<crate::models::keys::KeyPayload>,
}

/// Wire shape the web client expects for one archive job.
#[derive(Debug, Serialize)]
pub struct ServerResponse {
    pub success: bool,
    pub logs: Vec<String>,
    #[serde(rename = "folderName", skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(rename = "folderUrl", skip_serializing_if = "Option::is_none")]
    pub folder_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/process — runs one archive job synchronously and answers with
/// the accumulated log either way.
pub async fn process_archive(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProcessPayload>,
) -> impl IntoResponse {
    let logs = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = {
        let logs = Arc::clone(&logs);
        move |msg: &str| {
            tracing::info!("{}", msg);
            let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), msg);
            logs.lock().unwrap().push(line);
        }
    };

    match run_job(&state, &payload, &sink).await {
        Ok(filename) => {
            let logs = logs.lock().unwrap().clone();
            (
                StatusCode::OK,
                Json(ServerResponse {
                    success: true,
                    logs,
                    folder_name: Some(payload.folder_name),
                    folder_url: Some(format!("/archives/{}", filename)),
                    error: None,
                }),
            )
        }
        Err(e) => {
            tracing::error!("{}", e);
            sink(&format!("ERRO: {}", e));
            let logs = logs.lock().unwrap().clone();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ServerResponse {
                    success: false,
                    logs,
                    folder_name: None,
                    folder_url: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn run_job(
    state: &AppState,
    payload: &ProcessPayload,
    log: &(dyn Fn(&str) + Send + Sync),
) -> Result<String, ArchiveError> {
    if payload.url.trim().is_empty() {
        return Err(ArchiveError::MissingUrl);
    }

    log("=== INÍCIO DO PROCESSO ===");

    let api_key = state.resolve_api_key(payload.key_payload.as_ref())?;
    let fetcher = ProxyFetcher::new(&state.config.proxy_endpoint)?;

    log(&format!("A descarregar: {}", payload.url));
    let raw_html = fetcher.fetch_page(&payload.url).await?;

    log("A consultar a IA...");
    let cleaned_html = ContentCleaner::new(api_key).clean_content(&raw_html).await?;

    let archiver = Archiver::new(state.config.clone(), Arc::new(fetcher));
    let request = ArchiveRequest {
        destination_path: payload.folder_name.clone(),
        cleaned_html,
        original_url: payload.url.clone(),
    };
    let output = archiver.create_archive(&request, log).await?;

    tokio::fs::create_dir_all(&state.output_dir).await?;
    tokio::fs::write(state.output_dir.join(&output.filename), &output.zip_bytes).await?;

    log("=== PROCESSO FINALIZADO ===");
    Ok(output.filename)
}
