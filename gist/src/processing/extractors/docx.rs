use std::path::Path;

use async_trait::async_trait;

use super::{read_file, TextExtractor};
use crate::error::{GistError, Result};
use crate::models::DocumentType;

/// Body paragraphs joined by single spaces.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract_bytes(bytes: &[u8]) -> Result<String> {
        let docx = docx_rs::read_docx(bytes).map_err(|e| GistError::extraction("DOCX", e))?;

        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => {
                    Some(Self::paragraph_text(paragraph))
                }
                _ => None,
            })
            .collect();

        Ok(paragraphs.join(" ").trim().to_string())
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        for para_child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = para_child {
                for run_child in &run.children {
                    if let docx_rs::RunChild::Text(text) = run_child {
                        content.push_str(&text.text);
                    }
                }
            }
        }
        content
    }
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Docx
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        Self::extract_bytes(&bytes)
    }
}
