use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GistError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Error reading {format}: {message}")]
    Extraction { format: String, message: String },

    #[error("No content could be extracted from {0}")]
    NoContent(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Speech recognition failed: {0}")]
    Transcription(String),

    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation timed out after {0} seconds")]
    GenerationTimeout(u64),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Request cancelled: {0}")]
    Cancelled(String),
}

/// Pipeline stage an error belongs to, used as log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Precondition,
    Extraction,
    Summarization,
    Internal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Precondition => "precondition",
            Stage::Extraction => "extraction",
            Stage::Summarization => "summarization",
            Stage::Internal => "internal",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GistError {
    pub fn extraction(format: impl Into<String>, message: impl std::fmt::Display) -> Self {
        GistError::Extraction {
            format: format.into(),
            message: message.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            GistError::FileNotFound(_)
            | GistError::UnsupportedFileType(_)
            | GistError::MissingCredential(_)
            | GistError::OcrUnavailable(_)
            | GistError::TranscriptionUnavailable(_)
            | GistError::Validation(_) => Stage::Precondition,
            GistError::Extraction { .. }
            | GistError::NoContent(_)
            | GistError::Ocr(_)
            | GistError::Transcription(_) => Stage::Extraction,
            GistError::Generation(_)
            | GistError::GenerationTimeout(_)
            | GistError::LlmUnavailable(_)
            | GistError::LlmRateLimit { .. }
            | GistError::Http(_) => Stage::Summarization,
            GistError::Json(_)
            | GistError::Io(_)
            | GistError::Internal(_)
            | GistError::Cancelled(_) => Stage::Internal,
        }
    }

    /// Precondition failures abort before any extraction or summarization.
    pub fn is_precondition(&self) -> bool {
        self.stage() == Stage::Precondition
    }

    /// Machine-readable code sent in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GistError::FileNotFound(_) => "file_not_found",
            GistError::UnsupportedFileType(_) => "unsupported_file_type",
            GistError::MissingCredential(_) => "missing_credential",
            GistError::Extraction { .. } | GistError::Ocr(_) | GistError::Transcription(_) => {
                "extraction_failed"
            }
            GistError::NoContent(_) => "no_content",
            GistError::OcrUnavailable(_)
            | GistError::TranscriptionUnavailable(_)
            | GistError::LlmUnavailable(_) => "unavailable",
            GistError::Generation(_) | GistError::Http(_) => "generation_failed",
            GistError::GenerationTimeout(_) => "generation_timeout",
            GistError::LlmRateLimit { .. } => "rate_limited",
            GistError::Validation(_) | GistError::Json(_) => "invalid_request",
            GistError::Io(_) | GistError::Internal(_) => "internal_error",
            GistError::Cancelled(_) => "cancelled",
        }
    }
}

impl GistError {
    pub fn status(&self) -> StatusCode {
        match self {
            GistError::FileNotFound(_) => StatusCode::NOT_FOUND,
            GistError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            GistError::Validation(_) | GistError::Json(_) => StatusCode::BAD_REQUEST,
            GistError::Extraction { .. }
            | GistError::NoContent(_)
            | GistError::Ocr(_)
            | GistError::Transcription(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GistError::OcrUnavailable(_)
            | GistError::TranscriptionUnavailable(_)
            | GistError::LlmUnavailable(_)
            | GistError::MissingCredential(_)
            | GistError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            GistError::Generation(_) | GistError::Http(_) => StatusCode::BAD_GATEWAY,
            GistError::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GistError::LlmRateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            GistError::Io(_) | GistError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal details never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            GistError::Io(_) | GistError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GistError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        }));

        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_classified() {
        assert!(GistError::FileNotFound("a.txt".into()).is_precondition());
        assert!(GistError::OcrUnavailable("no tesseract".into()).is_precondition());
        assert!(GistError::MissingCredential("LLM_API_KEY".into()).is_precondition());
        assert!(!GistError::Generation("boom".into()).is_precondition());
    }

    #[test]
    fn test_extraction_error_message_names_format() {
        let err = GistError::extraction("PDF", "bad xref table");
        assert_eq!(err.to_string(), "Error reading PDF: bad xref table");
        assert_eq!(err.stage(), Stage::Extraction);
    }

    #[test]
    fn test_transcription_error_mentions_speech_recognition() {
        let err = GistError::Transcription("503 from service".into());
        assert!(err.to_string().contains("Speech recognition failed"));
    }

    #[test]
    fn test_into_response_status_codes() {
        let resp = GistError::FileNotFound("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = GistError::UnsupportedFileType("exe".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let resp = GistError::Generation("down".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = GistError::Internal("db password in here".into());
        assert_eq!(err.public_message(), "An internal error occurred");
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn test_cancelled_request_is_unavailable() {
        let err = GistError::Cancelled("server shutting down".into());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "cancelled");
        assert_eq!(err.public_message(), "Request cancelled: server shutting down");
    }
}
