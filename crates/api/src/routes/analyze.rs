use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediascan_analysis::{AnalysisOutcome, MediaRequest};
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// Fields of the `/analyze` multipart form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    file: Option<UploadedFile>,
    file_type: Option<String>,
    message: Option<String>,
}

#[derive(Debug)]
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl AnalyzeForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                    form.file = Some(UploadedFile {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                "file_type" | "message" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
                    if name == "file_type" {
                        form.file_type = Some(text);
                    } else {
                        form.message = Some(text);
                    }
                }
                _ => {
                    debug!(field = %name, "Ignoring unknown multipart field");
                }
            }
        }

        Ok(form)
    }

    fn into_request(self) -> Result<MediaRequest, ApiError> {
        let file = self
            .file
            .ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
        let file_type = self
            .file_type
            .ok_or_else(|| ApiError::BadRequest("Missing 'file_type' field".to_string()))?;

        let request = MediaRequest::new(
            file.bytes,
            file.filename,
            file_type,
            self.message.unwrap_or_default(),
        );
        Ok(match file.content_type {
            Some(content_type) => request.with_content_type(content_type),
            None => request,
        })
    }
}

/// `POST /analyze`: routes one upload to its modality pipeline.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = AnalyzeForm::read(&mut multipart).await?.into_request()?;
    debug!(
        filename = %request.filename,
        file_type = %request.file_type,
        bytes = request.bytes.len(),
        "Analyze request received"
    );

    match state.engine.analyze(request).await {
        AnalysisOutcome::Completed(envelope) => {
            Ok((StatusCode::OK, Json(envelope)).into_response())
        }
        AnalysisOutcome::Rejected(envelope) => {
            Ok((StatusCode::BAD_REQUEST, Json(envelope)).into_response())
        }
        AnalysisOutcome::Failed(err) => Err(err.into()),
    }
}
