//! OCR (Optical Character Recognition)
//!
//! Image text extraction through a local Tesseract engine (via leptess).
//! The engine is optional at runtime: when it cannot be initialized the
//! provider reports itself unavailable and image extraction fails with a
//! precondition error instead of crashing.
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! if ocr.is_available() {
//!     let text = ocr.ocr(&preprocess_image(bytes, &config.ocr)?).await?;
//! }
//! ```

mod preprocessing;
mod provider;

pub use preprocessing::preprocess_image;
pub use provider::OcrProvider;
