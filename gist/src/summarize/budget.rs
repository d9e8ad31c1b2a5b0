use text_splitter::{ChunkConfig, TextSplitter};
use tracing::{info, warn};

use super::Summarizer;
use crate::config::{BudgetStrategy, SummaryConfig};
use crate::error::Result;

/// Keeps the prompt inside the model's context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBudget {
    max_chars: usize,
    strategy: BudgetStrategy,
}

impl InputBudget {
    pub fn new(max_chars: usize, strategy: BudgetStrategy) -> Self {
        Self {
            max_chars: max_chars.max(1),
            strategy,
        }
    }

    pub fn from_config(config: &SummaryConfig) -> Self {
        Self::new(config.max_input_chars, config.strategy)
    }

    pub fn fits(&self, text: &str) -> bool {
        text.chars().count() <= self.max_chars
    }

    /// First `max_chars` characters, cut back to the last whitespace when one exists.
    pub fn truncate<'a>(&self, text: &'a str) -> &'a str {
        let Some((cut, _)) = text.char_indices().nth(self.max_chars) else {
            return text;
        };

        let head = &text[..cut];
        match head.rfind(char::is_whitespace) {
            Some(space) if space > 0 => head[..space].trim_end(),
            _ => head,
        }
    }

    pub fn chunks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        TextSplitter::new(ChunkConfig::new(self.max_chars))
            .chunks(text)
            .collect()
    }

    /// Summarize `text`, reducing it first when it is over budget.
    pub async fn summarize(
        &self,
        summarizer: &dyn Summarizer,
        instruction: &str,
        text: &str,
    ) -> Result<String> {
        if self.fits(text) {
            return summarizer.summarize(instruction, text).await;
        }

        match self.strategy {
            BudgetStrategy::Truncate => {
                let kept = self.truncate(text);
                warn!(
                    original_chars = text.chars().count(),
                    kept_chars = kept.chars().count(),
                    "Document exceeds input budget, truncating"
                );
                summarizer.summarize(instruction, kept).await
            }
            BudgetStrategy::MapReduce => {
                let chunks = self.chunks(text);
                info!(chunks = chunks.len(), "Document exceeds input budget, summarizing in parts");

                let mut partials = Vec::with_capacity(chunks.len());
                for chunk in chunks {
                    partials.push(summarizer.summarize(instruction, chunk).await?);
                }

                let combined = partials.join("\n\n");
                summarizer
                    .summarize(instruction, self.truncate(&combined))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn summarize(&self, _instruction: &str, text: &str) -> Result<String> {
            let mut inputs = self.inputs.lock().unwrap();
            inputs.push(text.to_string());
            Ok(format!("part{}", inputs.len()))
        }
    }

    #[test]
    fn test_truncate_cuts_at_whitespace() {
        let budget = InputBudget::new(12, BudgetStrategy::Truncate);
        assert_eq!(budget.truncate("alpha beta gamma delta"), "alpha beta");
        assert_eq!(budget.truncate("short"), "short");
    }

    #[test]
    fn test_truncate_without_whitespace_hard_cuts() {
        let budget = InputBudget::new(4, BudgetStrategy::Truncate);
        assert_eq!(budget.truncate("ééééééé"), "éééé");
    }

    #[tokio::test]
    async fn test_within_budget_passes_through() {
        let recorder = Recorder::default();
        let budget = InputBudget::new(100, BudgetStrategy::MapReduce);
        budget.summarize(&recorder, "Q", "small text").await.unwrap();
        assert_eq!(*recorder.inputs.lock().unwrap(), vec!["small text".to_string()]);
    }

    #[tokio::test]
    async fn test_map_reduce_summarizes_parts_then_whole() {
        let recorder = Recorder::default();
        let budget = InputBudget::new(20, BudgetStrategy::MapReduce);
        let text = "one two three four five six seven eight nine ten eleven twelve";

        let out = budget.summarize(&recorder, "Q", text).await.unwrap();

        let inputs = recorder.inputs.lock().unwrap();
        assert!(inputs.len() >= 3, "expected several map calls: {inputs:?}");
        assert!(inputs[..inputs.len() - 1].iter().all(|c| c.chars().count() <= 20));
        assert!(inputs.last().unwrap().starts_with("part1"));
        assert_eq!(out, format!("part{}", inputs.len()));
    }
}
