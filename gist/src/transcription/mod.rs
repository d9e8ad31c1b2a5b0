//! Speech-to-text for audio files and video sound tracks.
//!
//! Two engines sit behind [`TranscriptionProvider`]: a local whisper.cpp model
//! (`local/<name>` plus `TRANSCRIPTION_MODEL_PATH`) and any OpenAI-compatible
//! `/audio/transcriptions` endpoint (`openai/whisper-1`, ...). Extractors only
//! see the [`SpeechRecognizer`] trait.

mod api;
mod preprocessing;
mod provider;
mod whisper;

use async_trait::async_trait;

use crate::error::Result;

pub use preprocessing::{AudioPreprocessor, TARGET_SAMPLE_RATE};
pub use provider::TranscriptionProvider;

/// Converts encoded audio into text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// `format_hint` is the container extension ("mp3", "wav") when known.
    async fn recognize(&self, audio: &[u8], format_hint: Option<&str>) -> Result<String>;

    /// Fails with `TranscriptionUnavailable` when no engine is configured.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}
