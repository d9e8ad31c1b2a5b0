use std::time::Duration;

use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{parse_provider_model, TranscriptionConfig};
use crate::error::{GistError, Result};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for OpenAI-compatible `/audio/transcriptions` endpoints.
#[derive(Debug, Clone)]
pub struct TranscriptionApiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl TranscriptionApiClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GistError::TranscriptionUnavailable(
                "TRANSCRIPTION_API_KEY is required for the transcription API".to_string(),
            )
        })?;

        let (provider, model) = parse_provider_model(&config.model);
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| match provider.to_lowercase().as_str() {
                "openrouter" => OPENROUTER_BASE_URL.to_string(),
                _ => OPENAI_BASE_URL.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GistError::Transcription(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
            api_key,
        })
    }

    pub async fn transcribe(&self, audio_bytes: &[u8], file_extension: Option<&str>) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.transcribe_once(audio_bytes, file_extension).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < MAX_RETRIES && is_retryable(&e) => {
                    attempt += 1;
                    let delay_ms = 100 * 2_u64.pow(attempt - 1);
                    warn!(attempt, delay_ms, error = %e, "Transcription attempt failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn transcribe_once(&self, audio_bytes: &[u8], file_extension: Option<&str>) -> Result<String> {
        let file_part = multipart::Part::bytes(audio_bytes.to_vec())
            .file_name(format!("audio.{}", file_extension.unwrap_or("mp3")))
            .mime_str(infer_mime_type(file_extension))
            .map_err(|e| GistError::Transcription(format!("Invalid MIME type: {e}")))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!(url = %url, bytes = audio_bytes.len(), "Sending transcription request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GistError::Transcription("Request timeout".to_string())
                } else {
                    GistError::Transcription(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(map_http_error(status, &body));
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            GistError::Transcription(format!("Failed to parse transcription response: {e}"))
        })?;

        Ok(parsed.text.trim().to_string())
    }
}

fn is_retryable(error: &GistError) -> bool {
    matches!(
        error,
        GistError::Transcription(msg) if msg.starts_with("Server error") || msg.contains("timeout")
    )
}

fn infer_mime_type(file_extension: Option<&str>) -> &'static str {
    match file_extension {
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/mpeg",
    }
}

fn map_http_error(status: StatusCode, body: &str) -> GistError {
    let message = match status {
        StatusCode::UNAUTHORIZED => format!("Authentication failed (401): {body}"),
        StatusCode::TOO_MANY_REQUESTS => format!("Rate limit exceeded (429): {body}"),
        s if s.is_server_error() => format!("Server error ({}): {body}", s.as_u16()),
        s => format!("Transcription API error ({}): {body}", s.as_u16()),
    };
    GistError::Transcription(message)
}
