use std::path::Path;

use async_trait::async_trait;

use super::{read_file, TextExtractor};
use crate::error::Result;
use crate::models::DocumentType;

/// Plain text and markdown.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Text
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        Ok(decode_ignoring_invalid(&bytes).trim().to_string())
    }
}

/// Decode UTF-8, dropping byte sequences that are not valid.
pub fn decode_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // Safe: the prefix was just validated.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of input.
                    None => return out,
                }
            }
        }
    }
}
