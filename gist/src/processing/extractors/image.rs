use std::path::Path;

use async_trait::async_trait;

use super::{read_file, TextExtractor};
use crate::error::{GistError, Result};
use crate::models::DocumentType;
use crate::ocr::{preprocess_image, OcrProvider};

/// OCR over PNG and JPEG images.
pub struct ImageExtractor {
    ocr: OcrProvider,
}

impl ImageExtractor {
    pub fn new(ocr: OcrProvider) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextExtractor for ImageExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Image
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.ocr.unavailable_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        let processed = preprocess_image(&bytes, self.ocr.config())?;
        self.ocr.ocr(&processed).await.map_err(|e| match e {
            GistError::Ocr(msg) => GistError::extraction("image", msg),
            other => other,
        })
    }
}
