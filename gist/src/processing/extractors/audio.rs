use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{read_file, TextExtractor};
use crate::config::TranscriptionConfig;
use crate::error::{GistError, Result};
use crate::models::{extension_of, DocumentType};
use crate::transcription::{AudioPreprocessor, SpeechRecognizer};

/// Speech-to-text over an audio file.
#[derive(Clone)]
pub struct AudioExtractor {
    recognizer: Arc<dyn SpeechRecognizer>,
    max_file_size: u64,
    max_duration_secs: u64,
}

impl AudioExtractor {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, config: &TranscriptionConfig) -> Self {
        Self {
            recognizer,
            max_file_size: config.max_file_size,
            max_duration_secs: config.max_duration_secs,
        }
    }

    /// Transcribe already-loaded audio bytes.
    pub async fn transcribe_bytes(&self, bytes: Vec<u8>, format_hint: Option<&str>) -> Result<String> {
        if bytes.is_empty() {
            return Err(GistError::extraction("audio", "Empty audio data"));
        }

        if bytes.len() as u64 > self.max_file_size {
            return Err(GistError::extraction(
                "audio",
                format!(
                    "file size {} exceeds limit {}",
                    bytes.len(),
                    self.max_file_size
                ),
            ));
        }

        let bytes = if self.max_duration_secs > 0 {
            let hint = format_hint.map(str::to_string);
            let (bytes, duration) = tokio::task::spawn_blocking(move || {
                let duration = AudioPreprocessor::decode(&bytes, hint.as_deref())
                    .ok()
                    .map(|(samples, rate, channels)| {
                        AudioPreprocessor::duration_secs(samples.len(), rate, channels)
                    });
                (bytes, duration)
            })
            .await
            .map_err(|e| GistError::extraction("audio", format!("audio decoding crashed: {e}")))?;

            // Undecodable input is left to the recognizer, which has its own decoders.
            if let Some(duration) = duration {
                self.check_duration(duration)?;
            }
            bytes
        } else {
            bytes
        };

        self.recognize(&bytes, format_hint).await
    }

    /// Transcribe a WAV file whose duration the caller has already checked.
    pub(crate) async fn transcribe_prepared(&self, wav_path: &Path) -> Result<String> {
        let bytes = read_file(wav_path, DocumentType::Audio).await?;
        self.recognize(&bytes, Some("wav")).await
    }

    pub(crate) fn check_duration(&self, duration_secs: u64) -> Result<()> {
        debug!(duration_secs, "Audio duration");
        if self.max_duration_secs > 0 && duration_secs > self.max_duration_secs {
            return Err(GistError::extraction(
                "audio",
                format!(
                    "duration {}s exceeds limit of {}s",
                    duration_secs, self.max_duration_secs
                ),
            ));
        }
        Ok(())
    }

    async fn recognize(&self, bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        let text = self.recognizer.recognize(bytes, format_hint).await?;
        info!(words = text.split_whitespace().count(), "Audio transcribed");
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl TextExtractor for AudioExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Audio
    }

    fn ensure_ready(&self) -> Result<()> {
        self.recognizer.ensure_available()
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        let ext = extension_of(path);
        let hint = (!ext.is_empty()).then_some(ext.as_str());
        self.transcribe_bytes(bytes, hint).await
    }
}
