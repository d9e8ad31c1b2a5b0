use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{read_file, AudioExtractor, TextExtractor};
use crate::config::TranscriptionConfig;
use crate::error::{GistError, Result};
use crate::models::DocumentType;
use crate::transcription::{AudioPreprocessor, TARGET_SAMPLE_RATE};

/// Transcribes the sound track of a video.
///
/// The track is decoded to 16 kHz mono, written to a temporary WAV file in
/// the scratch directory and handed to the [`AudioExtractor`]. The WAV file
/// is removed before `extract` returns, whatever the outcome.
pub struct VideoExtractor {
    audio: AudioExtractor,
    scratch_dir: Option<PathBuf>,
    max_file_size: u64,
}

impl VideoExtractor {
    pub fn new(audio: AudioExtractor, config: &TranscriptionConfig) -> Self {
        Self {
            audio,
            scratch_dir: config.scratch_dir.clone(),
            max_file_size: config.max_file_size,
        }
    }

    fn create_artifact(&self, wav: &[u8]) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gist-audio-").suffix(".wav");

        let mut artifact = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| GistError::extraction("video", format!("cannot create audio file: {e}")))?;

        artifact
            .write_all(wav)
            .and_then(|_| artifact.flush())
            .map_err(|e| GistError::extraction("video", format!("cannot write audio file: {e}")))?;

        Ok(artifact)
    }
}

#[async_trait]
impl TextExtractor for VideoExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Video
    }

    fn ensure_ready(&self) -> Result<()> {
        self.audio.ensure_ready()
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;

        if bytes.len() as u64 > self.max_file_size {
            return Err(GistError::extraction(
                "video",
                format!("file size {} exceeds limit {}", bytes.len(), self.max_file_size),
            ));
        }

        let samples = tokio::task::spawn_blocking(move || {
            let (samples, sample_rate, channels) = AudioPreprocessor::decode(&bytes, None)?;
            AudioPreprocessor::resample_to_16khz_mono(samples, sample_rate, channels)
        })
        .await
        .map_err(|e| GistError::extraction("video", format!("audio decoding crashed: {e}")))??;

        self.audio
            .check_duration(AudioPreprocessor::duration_secs(samples.len(), TARGET_SAMPLE_RATE, 1))?;

        let artifact = self.create_artifact(&AudioPreprocessor::encode_wav(&samples))?;
        debug!(artifact = %artifact.path().display(), samples = samples.len(), "Audio track extracted");

        let result = self.audio.transcribe_prepared(artifact.path()).await;

        if let Err(e) = artifact.close() {
            warn!(error = %e, "Failed to remove temporary audio file");
        }

        result
    }
}
