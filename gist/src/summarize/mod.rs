//! Summarization: the [`Summarizer`] capability, its two implementations,
//! the output sanitizer and the input budget for long documents.

mod budget;
mod llm;
mod sanitize;
mod stand_in;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, SummarizerKind};
use crate::error::Result;
use crate::llm::LlmProvider;

pub use budget::InputBudget;
pub use llm::LlmSummarizer;
pub use sanitize::sanitize;
pub use stand_in::StandInSummarizer;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn summarize(&self, instruction: &str, text: &str) -> Result<String>;
}

/// Pick the implementation named by the configuration.
pub fn from_config(config: &Config, llm: &LlmProvider) -> Arc<dyn Summarizer> {
    match config.summarizer_kind() {
        SummarizerKind::StandIn => Arc::new(StandInSummarizer),
        SummarizerKind::Remote => Arc::new(LlmSummarizer::new(llm.clone())),
    }
}
