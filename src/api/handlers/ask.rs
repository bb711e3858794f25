//! `POST /api/ask`: optional file upload plus a question.
//!
//! Failures inside the pipeline are reported in the `answer` field as
//! `"An error occurred: <error>"` with an empty snippet. Only a malformed form
//! is rejected with an error status.

use crate::{
    pipeline::{FileIdentity, UploadedFile},
    types::{AppError, AskResponse, QueryResult, Result},
    AppState,
};
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct AskForm {
    file: Option<(String, Vec<u8>)>,
    question: Option<String>,
}

/// Upload a file (optional) and ask a question about it
pub async fn ask(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AskResponse>> {
    let form = read_form(&mut multipart, state.config.server.max_upload_bytes).await?;
    let question = form
        .question
        .ok_or_else(|| AppError::InvalidInput("Missing 'question' field".to_string()))?;

    // Uploads with the same name share a path, so save only under the lock
    let mut session = state.session.lock().await;

    let upload = match form.file {
        Some((name, bytes)) => {
            Some(save_upload(&state.config.server.upload_dir, &name, &bytes).await?)
        }
        None => None,
    };

    let result = match state.pipeline.handle(&mut session, upload, &question).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            QueryResult {
                answer: format!("An error occurred: {}", e),
                retrieved_text: String::new(),
            }
        }
    };

    Ok(Json(result.into()))
}

async fn read_form(multipart: &mut Multipart, max_upload_bytes: usize) -> Result<AskForm> {
    let mut form = AskForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                // Browsers send an empty part when no file was picked
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
                if name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if bytes.len() > max_upload_bytes {
                    return Err(AppError::Upload(format!(
                        "File exceeds the {} byte limit",
                        max_upload_bytes
                    )));
                }
                form.file = Some((name, bytes.to_vec()));
            }
            Some("question") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
                form.question = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Write the upload into `upload_dir`, keeping its extension for loader
/// selection.
async fn save_upload(upload_dir: &Path, name: &str, bytes: &[u8]) -> Result<UploadedFile> {
    let file_name = sanitize_file_name(name);
    let identity = FileIdentity::from_bytes(file_name.clone(), bytes);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Upload(format!("Failed to create upload dir: {}", e)))?;

    let path: PathBuf = upload_dir.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Upload(format!("Failed to save '{}': {}", file_name, e)))?;

    tracing::info!(file = %file_name, bytes = bytes.len(), "Saved upload");
    Ok(UploadedFile { identity, path })
}

/// Strip directories and anything outside `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
