//! One extractor per supported format family.
//!
//! Every extractor takes a path and returns the raw text it found. Blank
//! output and failures are classified by the dispatcher, so extractors only
//! report typed errors and never render sentinel strings themselves.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{GistError, Result};
use crate::models::DocumentType;

pub mod audio;
pub mod docx;
pub mod image;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod video;

pub use audio::AudioExtractor;
pub use docx::DocxExtractor;
pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use pptx::PptxExtractor;
pub use text::PlainTextExtractor;
pub use video::VideoExtractor;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn kind(&self) -> DocumentType;

    /// Precondition check run before the file is read, e.g. a missing OCR engine.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn extract(&self, path: &Path) -> Result<String>;
}

pub(crate) async fn read_file(path: &Path, kind: DocumentType) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GistError::FileNotFound(path.display().to_string()),
        _ => GistError::extraction(kind.format_name(), e),
    })
}
