use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext as WhisperRsContext, WhisperContextParameters,
};

use crate::config::TranscriptionConfig;
use crate::error::{GistError, Result};

use super::TARGET_SAMPLE_RATE;

/// Shared whisper.cpp model. Inference is serialized through the mutex.
#[derive(Clone)]
pub struct WhisperContext {
    context: Arc<Mutex<WhisperRsContext>>,
}

impl WhisperContext {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let model_path = config.model_path.as_ref().ok_or_else(|| {
            GistError::TranscriptionUnavailable(
                "TRANSCRIPTION_MODEL_PATH is required for local Whisper".to_string(),
            )
        })?;

        info!(model_path = %model_path, "Loading Whisper model");

        let ctx = WhisperRsContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| {
                GistError::TranscriptionUnavailable(format!("Failed to load Whisper model: {e}"))
            })?;

        Ok(Self {
            context: Arc::new(Mutex::new(ctx)),
        })
    }

    /// Transcribe 16 kHz mono samples in [-1.0, 1.0].
    pub async fn transcribe(&self, audio_samples: Vec<f32>) -> Result<String> {
        let context = Arc::clone(&self.context);

        debug!(
            sample_count = audio_samples.len(),
            duration_secs = audio_samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
            "Starting local transcription"
        );

        let text = tokio::task::spawn_blocking(move || {
            let ctx = context.blocking_lock();

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_print_progress(false);
            params.set_print_realtime(false);

            let mut state = ctx
                .create_state()
                .map_err(|e| GistError::Transcription(format!("Failed to create Whisper state: {e}")))?;

            state
                .full(params, &audio_samples)
                .map_err(|e| GistError::Transcription(format!("Whisper inference failed: {e}")))?;

            let mut segments = Vec::new();
            for i in 0..state.full_n_segments() {
                let segment = state
                    .get_segment(i)
                    .ok_or_else(|| GistError::Transcription(format!("Failed to get segment {i}")))?;
                let text = segment.to_str().map_err(|e| {
                    GistError::Transcription(format!("Failed to read segment {i}: {e}"))
                })?;
                segments.push(text.trim().to_string());
            }

            Ok::<String, GistError>(segments.join(" ").trim().to_string())
        })
        .await
        .map_err(|e| GistError::Transcription(format!("Transcription task panicked: {e}")))??;

        info!(text_length = text.len(), "Local transcription completed");

        Ok(text)
    }
}
