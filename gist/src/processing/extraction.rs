use std::fmt;

use crate::models::DocumentType;

/// Outcome of routing one file through an extractor.
///
/// Only `Text` carries usable content. The other variants are distinct so a
/// caller cannot mistake an empty document for a broken one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Empty(DocumentType),
    /// Lower-cased extension that no extractor claims.
    Unsupported(String),
    Failed { format: String, reason: String },
}

impl Extraction {
    pub fn is_usable(&self) -> bool {
        matches!(self, Extraction::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Extraction::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The extracted text, or the reserved string describing why there is none,
    /// e.g. `(no text found in PDF)` or `(error reading DOCX: ...)`.
    pub fn sentinel(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Text(text) => f.write_str(text),
            Extraction::Empty(kind) => write!(f, "(no text found in {})", kind.empty_subject()),
            Extraction::Unsupported(_) => f.write_str("(unsupported file type)"),
            Extraction::Failed { format, reason } => write!(f, "(error reading {format}: {reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinels() {
        assert_eq!(
            Extraction::Empty(DocumentType::Text).sentinel(),
            "(no text found in file)"
        );
        assert_eq!(
            Extraction::Empty(DocumentType::Pdf).sentinel(),
            "(no text found in PDF)"
        );
        assert_eq!(
            Extraction::Unsupported("exe".into()).sentinel(),
            "(unsupported file type)"
        );
        assert_eq!(
            Extraction::Failed {
                format: "DOCX".into(),
                reason: "bad zip".into()
            }
            .sentinel(),
            "(error reading DOCX: bad zip)"
        );
        assert_eq!(Extraction::Text("hi".into()).sentinel(), "hi");
    }

    #[test]
    fn test_only_text_is_usable() {
        assert!(Extraction::Text("x".into()).is_usable());
        assert!(!Extraction::Empty(DocumentType::Image).is_usable());
        assert!(!Extraction::Unsupported("zip".into()).is_usable());
        assert!(Extraction::Failed {
            format: "PDF".into(),
            reason: "x".into()
        }
        .text()
        .is_none());
    }
}
