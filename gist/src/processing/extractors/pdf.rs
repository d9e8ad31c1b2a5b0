use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{read_file, TextExtractor};
use crate::error::{GistError, Result};
use crate::models::DocumentType;

/// Text layer of every page, in page order.
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Pdf
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        debug!(bytes = bytes.len(), "Extracting PDF text");

        // pdf-extract panics on some malformed inputs; the join error catches it.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| GistError::extraction("PDF", format!("parser crashed: {e}")))?
            .map_err(|e| GistError::extraction("PDF", e))?;

        Ok(text.trim().to_string())
    }
}
