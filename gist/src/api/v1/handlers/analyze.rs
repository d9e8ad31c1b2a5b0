use axum::extract::{Multipart, State};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::error::GistError;
use crate::models::{FileInfo, UploadedFile};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeData {
    pub file_name: String,
    pub summary: String,
    pub file: FileInfo,
}

/// `POST /api/v1/analyze`
///
/// Multipart upload with a single `file` field. The upload is written to a
/// temporary file for the duration of the request and removed afterwards,
/// whatever the outcome.
pub async fn analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<AnalyzeData> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return GistError::Validation(format!("Invalid multipart body: {e}")).into();
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return GistError::Validation(format!("Failed to read file: {e}")).into();
            }
        };
        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return GistError::Validation("Missing 'file' field".to_string()).into();
    };
    if file_name.trim().is_empty() {
        return GistError::Validation("Uploaded file has no name".to_string()).into();
    }

    info!(file = %file_name, size_bytes = bytes.len(), "Upload received");

    let upload_dir = state.config.server.upload_dir.clone();
    let name = file_name.clone();
    let uploaded = match tokio::task::spawn_blocking(move || {
        UploadedFile::create(upload_dir.as_deref(), &name, &bytes)
    })
    .await
    {
        Ok(Ok(uploaded)) => uploaded,
        Ok(Err(e)) => return e.into(),
        Err(e) => return GistError::Internal(format!("Upload task failed: {e}")).into(),
    };

    // The task owns the upload, so it is dropped (and deleted) even if analysis panics.
    let analyzer = state.analyzer.clone();
    let shutdown = state.shutdown.child_token();
    let task = tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                Err(GistError::Cancelled("server is shutting down".to_string()))
            }
            result = analyzer.analyze(uploaded.path()) => result,
        };
        if let Err(e) = uploaded.delete() {
            warn!(error = %e, "Failed to remove uploaded file");
        }
        result
    });

    match task.await {
        Ok(Ok(analysis)) => ApiResponse::success(AnalyzeData {
            file_name,
            summary: analysis.summary,
            file: analysis.file,
        }),
        Ok(Err(e)) => {
            warn!(file = %file_name, stage = %e.stage(), error = %e, "Analysis failed");
            e.into()
        }
        Err(e) => GistError::Internal(format!("Analysis task failed: {e}")).into(),
    }
}
