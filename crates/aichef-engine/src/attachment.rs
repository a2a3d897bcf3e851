//! Attachment staging.
//!
//! At most one image can be staged for the turn being composed. Staging is
//! independent of the message text; committing a turn always clears it.
//! The image bytes are only used for the local preview: the backend is told
//! that an image was present, nothing more.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, warn};

/// Warning shown when a non-image file is selected.
pub const NOT_AN_IMAGE_TEXT: &str = "Please select an image file (e.g., JPG, PNG).";

/// A file picked by the user, with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub media_type: String,
}

impl SelectedFile {
    /// Select a file, deriving its media type from the file name.
    ///
    /// Unknown extensions are declared as `application/octet-stream`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let media_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self { path, media_type }
    }

    /// Select a file whose media type is already known.
    pub fn with_media_type(path: impl Into<PathBuf>, media_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            media_type: media_type.into(),
        }
    }

    /// Whether the declared media type is an image type.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// File name for display and logs.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().to_string())
    }
}

/// A decoded image waiting to be sent with the next turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAttachment {
    /// Directly displayable `data:` URI of the image.
    pub preview_source: String,
    /// The file it came from.
    pub origin: SelectedFile,
    /// Size of the original file in bytes.
    pub size_bytes: u64,
}

/// Errors from attachment selection.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The selected file does not declare an image media type.
    #[error("Please select an image file (e.g., JPG, PNG).")]
    NotAnImage { name: String, media_type: String },

    /// The file could not be read.
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check that a file may be staged.
pub fn prepare(file: SelectedFile) -> Result<SelectedFile, AttachmentError> {
    if file.is_image() {
        Ok(file)
    } else {
        warn!(file = %file.name(), media_type = %file.media_type, "Selected file is not an image");
        Err(AttachmentError::NotAnImage {
            name: file.name(),
            media_type: file.media_type,
        })
    }
}

/// Read an image file and encode it as a `data:` URI.
pub async fn decode_preview(file: SelectedFile) -> Result<StagedAttachment, AttachmentError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| AttachmentError::Io {
            path: file.path.clone(),
            source,
        })?;

    let preview_source = format!("data:{};base64,{}", file.media_type, STANDARD.encode(&bytes));
    debug!(file = %file.name(), bytes = bytes.len(), "Decoded image preview");

    Ok(StagedAttachment {
        preview_source,
        origin: file,
        size_bytes: bytes.len() as u64,
    })
}

/// Holds the single pending attachment, if any.
#[derive(Debug, Default)]
pub struct AttachmentStaging {
    staged: Option<StagedAttachment>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the image at `path`, replacing any existing attachment.
    ///
    /// Non-image files and unreadable files leave the current staging as it was.
    pub async fn stage(&mut self, path: impl AsRef<Path>) -> Result<&StagedAttachment, AttachmentError> {
        self.stage_file(SelectedFile::from_path(path.as_ref())).await
    }

    /// Stage an already-selected file.
    pub async fn stage_file(&mut self, file: SelectedFile) -> Result<&StagedAttachment, AttachmentError> {
        let file = prepare(file)?;
        let attachment = decode_preview(file).await?;
        Ok(self.install(attachment))
    }

    /// Put a decoded attachment in place, replacing any existing one.
    pub fn install(&mut self, attachment: StagedAttachment) -> &StagedAttachment {
        info!(file = %attachment.origin.name(), "Image selected");
        self.staged.insert(attachment)
    }

    /// Remove the staged attachment. Returns whether one was present.
    pub fn clear(&mut self) -> bool {
        let removed = self.staged.take().is_some();
        if removed {
            debug!("Staged attachment cleared");
        }
        removed
    }

    /// Whether an attachment is staged.
    pub fn is_present(&self) -> bool {
        self.staged.is_some()
    }

    /// The staged attachment.
    pub fn current(&self) -> Option<&StagedAttachment> {
        self.staged.as_ref()
    }
}
