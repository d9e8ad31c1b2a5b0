use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{parse_provider_model, TranscriptionConfig};
use crate::error::{GistError, Result};

use super::api::TranscriptionApiClient;
use super::preprocessing::AudioPreprocessor;
use super::whisper::WhisperContext;
use super::SpeechRecognizer;

#[derive(Clone)]
enum TranscriptionBackend {
    Local { whisper: WhisperContext },
    Api { client: TranscriptionApiClient },
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct TranscriptionProvider {
    backend: TranscriptionBackend,
    config: TranscriptionConfig,
}

impl TranscriptionProvider {
    /// Never fails: a backend that cannot start leaves the provider unavailable.
    pub fn new(config: &TranscriptionConfig) -> Self {
        let (provider, _model_name) = parse_provider_model(&config.model);

        let backend = if provider.eq_ignore_ascii_case("local") {
            match WhisperContext::new(config) {
                Ok(whisper) => {
                    info!("Local Whisper backend initialized");
                    TranscriptionBackend::Local { whisper }
                }
                Err(e) => {
                    let reason = format!("Whisper backend unavailable: {e}");
                    warn!("{}", reason);
                    TranscriptionBackend::Unavailable { reason }
                }
            }
        } else {
            match TranscriptionApiClient::new(config) {
                Ok(client) => {
                    info!(provider = %provider, "Transcription API backend initialized");
                    TranscriptionBackend::Api { client }
                }
                Err(e) => {
                    let reason = format!("Transcription API backend unavailable: {e}");
                    warn!("{}", reason);
                    TranscriptionBackend::Unavailable { reason }
                }
            }
        };

        Self {
            backend,
            config: config.clone(),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: TranscriptionBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: TranscriptionConfig::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, TranscriptionBackend::Unavailable { .. })
    }

    pub async fn transcribe(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(timeout_duration, self.transcribe_internal(audio_bytes, format_hint))
            .await
        {
            Ok(inner_result) => inner_result,
            Err(_) => Err(GistError::Transcription(format!(
                "Transcription timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn transcribe_internal(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        match &self.backend {
            TranscriptionBackend::Local { whisper } => {
                let (samples, sample_rate, channels) =
                    AudioPreprocessor::decode(audio_bytes, format_hint)?;
                let pcm = AudioPreprocessor::resample_to_16khz_mono(samples, sample_rate, channels)?;
                whisper.transcribe(pcm).await
            }
            TranscriptionBackend::Api { client } => client.transcribe(audio_bytes, format_hint).await,
            TranscriptionBackend::Unavailable { reason } => {
                Err(GistError::TranscriptionUnavailable(reason.clone()))
            }
        }
    }
}

#[async_trait]
impl SpeechRecognizer for TranscriptionProvider {
    async fn recognize(&self, audio: &[u8], format_hint: Option<&str>) -> Result<String> {
        self.transcribe(audio, format_hint).await
    }

    fn ensure_available(&self) -> Result<()> {
        match &self.backend {
            TranscriptionBackend::Unavailable { reason } => {
                Err(GistError::TranscriptionUnavailable(reason.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(api_key: Option<&str>) -> TranscriptionConfig {
        TranscriptionConfig {
            model: "openai/whisper-1".to_string(),
            api_key: api_key.map(str::to_string),
            ..TranscriptionConfig::default()
        }
    }

    #[test]
    fn test_local_without_model_degrades() {
        let provider = TranscriptionProvider::new(&TranscriptionConfig::default());
        assert!(!provider.is_available());
        assert!(matches!(
            provider.ensure_available(),
            Err(GistError::TranscriptionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_transcribe_returns_error() {
        let provider = TranscriptionProvider::new(&api_config(None));
        let result = provider.transcribe(&[], None).await;
        assert!(matches!(result, Err(GistError::TranscriptionUnavailable(_))));
    }

    #[test]
    fn test_api_backend_with_key_is_available() {
        let provider = TranscriptionProvider::new(&api_config(Some("test-key")));
        assert!(provider.is_available());
        assert!(provider.ensure_available().is_ok());
        assert!(provider.clone().is_available());
    }
}
