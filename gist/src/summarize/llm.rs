use async_trait::async_trait;
use tracing::debug;

use super::Summarizer;
use crate::error::{GistError, Result};
use crate::llm::LlmProvider;

/// Summarizer backed by a remote chat-completion model.
pub struct LlmSummarizer {
    provider: LlmProvider,
}

impl LlmSummarizer {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    /// The single prompt sent to the model.
    pub fn build_prompt(instruction: &str, text: &str) -> String {
        format!("{}\n\n{}", instruction.trim_end(), text)
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn summarize(&self, instruction: &str, text: &str) -> Result<String> {
        let prompt = Self::build_prompt(instruction, text);
        debug!(
            model = self.provider.model().unwrap_or("unavailable"),
            prompt_chars = prompt.chars().count(),
            "Requesting summary"
        );

        self.provider.complete(&prompt).await.map_err(|e| match e {
            GistError::Generation(_)
            | GistError::GenerationTimeout(_)
            | GistError::LlmRateLimit { .. } => e,
            other => GistError::Generation(other.to_string()),
        })
    }
}
