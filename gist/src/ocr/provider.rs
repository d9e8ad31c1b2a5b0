use std::sync::Arc;
use std::time::Duration;

use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{GistError, Result};

#[derive(Clone)]
enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
}

fn create_tesseract(config: &OcrConfig) -> std::result::Result<LepTess, String> {
    LepTess::new(config.data_path.as_deref(), &config.languages).map_err(|e| e.to_string())
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let backend = match create_tesseract(config) {
            Ok(lt) => {
                info!(languages = %config.languages, "Tesseract OCR initialized");
                OcrBackend::Local {
                    tesseract: Arc::new(Mutex::new(lt)),
                }
            }
            Err(e) => {
                let reason = match &config.data_path {
                    Some(path) => format!("Tesseract not available (data path {path}): {e}"),
                    None => format!("Tesseract not available: {e}"),
                };
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self {
            backend,
            config: config.clone(),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: OcrBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: OcrConfig::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Error to report when an image arrives and no engine is configured.
    pub fn unavailable_error(&self) -> Option<GistError> {
        match &self.backend {
            OcrBackend::Unavailable { reason } => Some(GistError::OcrUnavailable(reason.clone())),
            OcrBackend::Local { .. } => None,
        }
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(timeout_duration, self.ocr_internal(image_bytes)).await {
            Ok(inner_result) => inner_result,
            Err(_) => Err(GistError::Ocr(format!(
                "OCR operation timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn ocr_internal(&self, image_bytes: &[u8]) -> Result<String> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let bytes = image_bytes.to_vec();
                let tesseract = Arc::clone(tesseract);

                let text = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| GistError::Ocr(format!("Failed to set image: {e}")))?;
                    lt.get_utf8_text()
                        .map_err(|e| GistError::Ocr(format!("Failed to extract text: {e}")))
                })
                .await
                .map_err(|e| GistError::Ocr(format!("OCR task panicked: {e}")))??;

                Ok(text.trim().to_string())
            }
            OcrBackend::Unavailable { reason } => Err(GistError::OcrUnavailable(reason.clone())),
        }
    }
}
