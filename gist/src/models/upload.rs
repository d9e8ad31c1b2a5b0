use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{GistError, Result};

/// A file received through the upload endpoint.
///
/// The bytes live in a temporary file that keeps the declared extension so the
/// dispatcher can route it. The file is removed when this value is dropped,
/// whether processing succeeded or not.
#[derive(Debug)]
pub struct UploadedFile {
    file: NamedTempFile,
    original_name: String,
}

impl UploadedFile {
    pub fn create(dir: Option<&Path>, original_name: &str, bytes: &[u8]) -> Result<Self> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix("gist-upload-").suffix(&extension);

        let mut file = match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            file,
            original_name: original_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Remove the file now and report failures instead of ignoring them on drop.
    pub fn delete(self) -> Result<PathBuf> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .map_err(|e| GistError::Internal(format!("Failed to delete upload: {e}")))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_keeps_extension_and_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let upload = UploadedFile::create(Some(dir.path()), "Report.PDF", b"%PDF-1.4").unwrap();
            assert!(upload.path().exists());
            assert_eq!(
                upload.path().extension().and_then(|e| e.to_str()),
                Some("PDF")
            );
            assert_eq!(upload.original_name(), "Report.PDF");
            upload.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_delete() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadedFile::create(Some(dir.path()), "notes.txt", b"hi").unwrap();
        let path = upload.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_name_without_extension() {
        let upload = UploadedFile::create(None, "README", b"text").unwrap();
        assert!(upload.path().extension().is_none());
    }
}
