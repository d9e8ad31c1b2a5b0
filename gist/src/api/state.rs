use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::LlmProvider;
use crate::ocr::OcrProvider;
use crate::pipeline::Analyzer;
use crate::transcription::TranscriptionProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Analyzer,
    pub ocr: OcrProvider,
    pub transcription: TranscriptionProvider,
    pub llm: LlmProvider,
    /// Cancelled when the server starts shutting down; in-flight analyses stop early.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        ocr: OcrProvider,
        transcription: TranscriptionProvider,
        llm: LlmProvider,
    ) -> Self {
        let analyzer = Analyzer::from_providers(&config, ocr.clone(), transcription.clone(), &llm);

        Self {
            config: Arc::new(config),
            analyzer,
            ocr,
            transcription,
            llm,
            shutdown: CancellationToken::new(),
        }
    }
}
