use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions the dispatcher recognizes, lower-case and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "pdf", "docx", "pptx", "png", "jpg", "jpeg", "mp3", "mp4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Plain text and markdown
    Text,
    Pdf,
    Docx,
    Pptx,
    Image,
    Audio,
    Video,
}

impl DocumentType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "md" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "mp3" => Some(Self::Audio),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Name used in error sentinels, e.g. "(error reading PDF: ...)".
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Text => "text file",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// What follows "no text found in" for an empty extraction.
    pub fn empty_subject(&self) -> &'static str {
        match self {
            Self::Text => "file",
            other => other.format_name(),
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::Pptx => write!(f, "pptx"),
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Lower-cased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Basic metadata shown next to a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Upper-cased extension, e.g. "PDF"
    #[serde(rename = "type")]
    pub file_type: String,
    pub size_bytes: u64,
    pub size_kb: f64,
    /// Extracted text length in characters
    pub content_length: usize,
}

impl FileInfo {
    pub fn new(path: &Path, size_bytes: u64, extracted: &str) -> Self {
        Self {
            file_type: extension_of(path).to_uppercase(),
            size_bytes,
            size_kb: size_bytes as f64 / 1024.0,
            content_length: extracted.chars().count(),
        }
    }
}

impl std::fmt::Display for FileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File Information:")?;
        writeln!(f, "- Type: {}", self.file_type)?;
        writeln!(f, "- Size: {:.1} KB", self.size_kb)?;
        write!(f, "- Content Length: {} characters", self.content_length)
    }
}

/// Result of running one file through extraction and summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub file: FileInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(DocumentType::from_extension("PDF"), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::from_extension(".Md"), Some(DocumentType::Text));
        assert_eq!(
            DocumentType::from_extension("JPEG"),
            Some(DocumentType::Image)
        );
        assert_eq!(DocumentType::from_extension("exe"), None);
        assert_eq!(DocumentType::from_extension("wav"), None);
    }

    #[test]
    fn test_every_supported_extension_maps_to_a_type() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(
                DocumentType::from_extension(ext).is_some(),
                "{ext} should be recognized"
            );
        }
    }

    #[test]
    fn test_from_path_without_extension() {
        assert_eq!(DocumentType::from_path(&PathBuf::from("README")), None);
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("/tmp/Slides.PPTX")),
            Some(DocumentType::Pptx)
        );
    }

    #[test]
    fn test_file_info_display() {
        let info = FileInfo::new(&PathBuf::from("notes.txt"), 2048, "Hello world");
        assert_eq!(info.file_type, "TXT");
        assert_eq!(info.content_length, 11);
        let rendered = info.to_string();
        assert!(rendered.contains("- Type: TXT"));
        assert!(rendered.contains("- Size: 2.0 KB"));
        assert!(rendered.contains("- Content Length: 11 characters"));
    }

    #[test]
    fn test_file_info_serializes_camel_case() {
        let info = FileInfo::new(&PathBuf::from("a.pdf"), 512, "abc");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "PDF");
        assert_eq!(json["contentLength"], 3);
        assert_eq!(json["sizeKb"], 0.5);
    }
}
