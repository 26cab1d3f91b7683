//! Turning a user-chosen file into a [`CapturedImage`].

use std::io;
use std::path::{Path, PathBuf};

use dawa_types::{CapturedImage, ImageMime};
use thiserror::Error;

/// Largest photo accepted for inline submission.
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no file was selected")]
    NoFile,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a supported image (expected JPEG, PNG, WebP, HEIC or HEIF)", .path.display())]
    NotAnImage { path: PathBuf },
    #[error("{} is empty", .path.display())]
    Empty { path: PathBuf },
    #[error("{} is {size} bytes; the limit is {}", .path.display(), MAX_IMAGE_BYTES)]
    TooLarge { path: PathBuf, size: u64 },
}

/// Read an image for submission.
///
/// `None` is the "dialog closed without a file" case and yields
/// [`CaptureError::NoFile`], which callers treat as a no-op.
pub async fn load_image(path: Option<&Path>) -> Result<CapturedImage, CaptureError> {
    let path = path.ok_or(CaptureError::NoFile)?;
    let read_err = |source: io::Error| CaptureError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageMime::from_extension)
        .ok_or_else(|| CaptureError::NotAnImage {
            path: path.to_path_buf(),
        })?;

    let size = tokio::fs::metadata(path).await.map_err(read_err)?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(CaptureError::TooLarge {
            path: path.to_path_buf(),
            size,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(read_err)?;
    if !matches_signature(&bytes, mime) {
        return Err(CaptureError::NotAnImage {
            path: path.to_path_buf(),
        });
    }

    CapturedImage::new(bytes, mime).map_err(|_| CaptureError::Empty {
        path: path.to_path_buf(),
    })
}

/// Check the leading magic bytes against the extension-derived type.
///
/// Empty input passes so the caller can report it as empty.
fn matches_signature(bytes: &[u8], mime: ImageMime) -> bool {
    if bytes.is_empty() {
        return true;
    }
    match mime {
        ImageMime::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        ImageMime::Png => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        ImageMime::Webp => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        // ISO-BMFF: size(4) "ftyp" brand(4)
        ImageMime::Heic | ImageMime::Heif => bytes.len() >= 12 && &bytes[4..8] == b"ftyp",
    }
}
