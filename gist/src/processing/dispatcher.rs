use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::extraction::Extraction;
use super::extractors::{
    AudioExtractor, DocxExtractor, ImageExtractor, PdfExtractor, PlainTextExtractor,
    PptxExtractor, TextExtractor, VideoExtractor,
};
use crate::config::TranscriptionConfig;
use crate::error::{GistError, Result};
use crate::models::{extension_of, DocumentType};
use crate::ocr::OcrProvider;
use crate::transcription::SpeechRecognizer;

/// Routes a path to the extractor registered for its extension.
#[derive(Clone, Default)]
pub struct Dispatcher {
    extractors: HashMap<DocumentType, Arc<dyn TextExtractor>>,
}

impl Dispatcher {
    /// Full set of extractors backed by the given OCR and speech engines.
    pub fn with_engines(
        ocr: OcrProvider,
        recognizer: Arc<dyn SpeechRecognizer>,
        transcription: &TranscriptionConfig,
    ) -> Self {
        let audio = AudioExtractor::new(recognizer, transcription);
        let video = VideoExtractor::new(audio.clone(), transcription);

        Self::default()
            .register(Arc::new(PlainTextExtractor))
            .register(Arc::new(PdfExtractor))
            .register(Arc::new(DocxExtractor))
            .register(Arc::new(PptxExtractor))
            .register(Arc::new(ImageExtractor::new(ocr)))
            .register(Arc::new(audio))
            .register(Arc::new(video))
    }

    /// Add or replace the extractor for `extractor.kind()`.
    pub fn register(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(extractor.kind(), extractor);
        self
    }

    /// Extract the text of `path`.
    ///
    /// Precondition failures (missing file, missing OCR or speech engine) are
    /// returned as `Err` before anything is read. Every other problem becomes
    /// an [`Extraction`] value.
    pub async fn route(&self, path: &Path) -> Result<Extraction> {
        if !path.is_file() {
            return Err(GistError::FileNotFound(path.display().to_string()));
        }

        let Some(kind) = DocumentType::from_path(path) else {
            let ext = extension_of(path);
            warn!(file = %path.display(), extension = %ext, "Unsupported file type");
            return Ok(Extraction::Unsupported(ext));
        };

        let Some(extractor) = self.extractors.get(&kind) else {
            warn!(file = %path.display(), kind = %kind, "No extractor registered");
            return Ok(Extraction::Unsupported(extension_of(path)));
        };

        extractor.ensure_ready()?;

        debug!(file = %path.display(), kind = %kind, "Extracting text");

        match extractor.extract(path).await {
            Ok(text) if text.trim().is_empty() => {
                info!(file = %path.display(), kind = %kind, "No text found");
                Ok(Extraction::Empty(kind))
            }
            Ok(text) => {
                info!(file = %path.display(), kind = %kind, chars = text.chars().count(), "Text extracted");
                Ok(Extraction::Text(text.trim().to_string()))
            }
            Err(e) if e.is_precondition() => Err(e),
            Err(e) => {
                warn!(file = %path.display(), kind = %kind, stage = %e.stage(), error = %e, "Extraction failed");
                let reason = match e {
                    GistError::Extraction { message, .. } => message,
                    other => other.to_string(),
                };
                Ok(Extraction::Failed {
                    format: kind.format_name().to_string(),
                    reason,
                })
            }
        }
    }
}
