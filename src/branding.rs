//! Custom site logo uploaded by an admin.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::info;

pub const LOGO_FILE_NAME: &str = "custom_logo.png";
pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;
pub const LOGO_ROUTE: &str = "/branding/logo";
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Error)]
pub enum BrandingError {
    #[error("No file provided")]
    Empty,

    #[error("File type not allowed: {0}")]
    UnsupportedExtension(String),

    #[error("File is {0} bytes, the limit is 2 MiB")]
    TooLarge(usize),

    #[error("File content is not an image")]
    NotAnImage,

    #[error("Failed to store logo: {0}")]
    Io(#[from] std::io::Error),
}

fn has_allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct BrandingStore {
    uploads_dir: PathBuf,
}

impl BrandingStore {
    pub fn new<P: AsRef<Path>>(uploads_dir: P) -> Self {
        Self {
            uploads_dir: uploads_dir.as_ref().to_path_buf(),
        }
    }

    pub fn logo_path(&self) -> PathBuf {
        self.uploads_dir.join(LOGO_FILE_NAME)
    }

    /// Validates and stores an uploaded logo, replacing any previous one.
    /// Returns the detected mime type.
    pub fn save_logo(&self, filename: &str, data: &[u8]) -> Result<&'static str, BrandingError> {
        if data.is_empty() {
            return Err(BrandingError::Empty);
        }
        if !has_allowed_extension(filename) {
            return Err(BrandingError::UnsupportedExtension(filename.to_string()));
        }
        if data.len() > MAX_LOGO_BYTES {
            return Err(BrandingError::TooLarge(data.len()));
        }
        let mime = match infer::get(data) {
            Some(kind) if kind.mime_type().starts_with("image/") => kind.mime_type(),
            _ => return Err(BrandingError::NotAnImage),
        };

        std::fs::create_dir_all(&self.uploads_dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.uploads_dir)?;
        tmp.write_all(data)?;
        tmp.persist(self.logo_path()).map_err(|e| e.error)?;

        info!("Stored new logo ({} bytes, {})", data.len(), mime);
        Ok(mime)
    }

    /// Reads the stored logo, if any.
    pub fn read_logo(&self) -> std::io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.logo_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// URL of the uploaded logo, versioned by modification time. None when no
    /// logo was uploaded and the frontend default applies.
    pub fn logo_url(&self) -> Option<String> {
        let modified = std::fs::metadata(self.logo_path())
            .and_then(|m| m.modified())
            .ok()?;
        let version = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Some(format!("{}?v={}", LOGO_ROUTE, version))
    }
}
