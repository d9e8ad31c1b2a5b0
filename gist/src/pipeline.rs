use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{Config, SummaryConfig};
use crate::error::{GistError, Result, Stage};
use crate::llm::LlmProvider;
use crate::models::{Analysis, FileInfo};
use crate::ocr::OcrProvider;
use crate::processing::{Dispatcher, Extraction};
use crate::summarize::{self, sanitize, InputBudget, Summarizer};
use crate::transcription::{SpeechRecognizer, TranscriptionProvider};

/// Runs one file through extraction, summarization and sanitizing.
///
/// Each call owns its path and buffers; the analyzer itself holds no mutable
/// state and is cheap to clone into request tasks.
#[derive(Clone)]
pub struct Analyzer {
    dispatcher: Dispatcher,
    summarizer: Arc<dyn Summarizer>,
    budget: InputBudget,
    instruction: String,
    timeout: Duration,
}

impl Analyzer {
    pub fn new(
        dispatcher: Dispatcher,
        summarizer: Arc<dyn Summarizer>,
        summary: &SummaryConfig,
        timeout_secs: u64,
    ) -> Self {
        Self {
            dispatcher,
            summarizer,
            budget: InputBudget::from_config(summary),
            instruction: summary.instruction.clone(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Wire the configured engines into a dispatcher and pick the summarizer.
    pub fn from_providers(
        config: &Config,
        ocr: OcrProvider,
        transcription: TranscriptionProvider,
        llm: &LlmProvider,
    ) -> Self {
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(transcription);
        let dispatcher = Dispatcher::with_engines(ocr, recognizer, &config.transcription);
        Self::new(
            dispatcher,
            summarize::from_config(config, llm),
            &config.summary,
            config.generation_timeout_secs(),
        )
    }

    pub fn summarizer_name(&self) -> &'static str {
        self.summarizer.name()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Extract usable text from `path`.
    ///
    /// Anything other than real text is an error: absence of content halts the
    /// pipeline before summarization.
    pub async fn extract(&self, path: &Path) -> Result<String> {
        let file = display_name(path);

        let outcome = match self.dispatcher.route(path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %file, stage = %e.stage(), error = %e, "Extraction aborted");
                return Err(e);
            }
        };

        match outcome {
            Extraction::Text(text) => Ok(text),
            Extraction::Unsupported(ext) => {
                let shown = if ext.is_empty() { "(none)".to_string() } else { ext };
                Err(GistError::UnsupportedFileType(shown))
            }
            Extraction::Empty(kind) => {
                warn!(file = %file, stage = %Stage::Extraction, kind = %kind, "No usable content");
                Err(GistError::NoContent(file))
            }
            Extraction::Failed { format, reason } => {
                warn!(file = %file, stage = %Stage::Extraction, format = %format, reason = %reason, "Extraction failed");
                Err(GistError::Extraction {
                    format,
                    message: reason,
                })
            }
        }
    }

    /// Summarize already-extracted text with `instruction`.
    pub async fn summarize_text(&self, instruction: &str, text: &str) -> Result<String> {
        let call = self
            .budget
            .summarize(self.summarizer.as_ref(), instruction, text);

        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!(stage = %e.stage(), summarizer = self.summarizer.name(), error = %e, "Summarization failed");
                return Err(e);
            }
            Err(_) => {
                let secs = self.timeout.as_secs();
                error!(stage = %Stage::Summarization, summarizer = self.summarizer.name(), timeout_secs = secs, "Summarization timed out");
                return Err(GistError::GenerationTimeout(secs));
            }
        };

        Ok(sanitize(&raw))
    }

    /// Extract, summarize with the configured instruction, and describe the file.
    pub async fn analyze(&self, path: &Path) -> Result<Analysis> {
        let text = self.extract(path).await?;
        let size_bytes = tokio::fs::metadata(path).await?.len();

        let summary = self.summarize_text(&self.instruction, &text).await?;
        let file = FileInfo::new(path, size_bytes, &text);

        info!(
            file = %display_name(path),
            summarizer = self.summarizer.name(),
            chars = file.content_length,
            "Analysis complete"
        );

        Ok(Analysis { summary, file })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
