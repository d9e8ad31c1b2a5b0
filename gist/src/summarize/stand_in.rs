use async_trait::async_trait;

use super::Summarizer;
use crate::error::Result;

const SNIPPET_CHARS: usize = 200;

/// Offline, deterministic summarizer.
///
/// Echoes the instruction and the start of the text behind a `(stub)` marker
/// so its output can never pass for a real summary.
pub struct StandInSummarizer;

impl StandInSummarizer {
    pub fn render(instruction: &str, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "(stub) No document text available.".to_string();
        }

        let mut snippet: String = text.chars().take(SNIPPET_CHARS).collect();
        if text.chars().count() > SNIPPET_CHARS {
            snippet.push_str("...");
        }

        format!("(stub) AI Response to '{instruction}':\n\nSummary Preview:\n{snippet}")
    }
}

#[async_trait]
impl Summarizer for StandInSummarizer {
    fn name(&self) -> &'static str {
        "stand-in"
    }

    async fn summarize(&self, instruction: &str, text: &str) -> Result<String> {
        Ok(Self::render(instruction, text))
    }
}
