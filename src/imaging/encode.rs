/// Reading a picked file into a `DataUrl`

use std::path::{Path, PathBuf};

use super::data_url::DataUrl;
use crate::error::{Result, StudioError};

/// File extensions offered in the open dialog
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Read a file and encode it as a `data:` URL
///
/// The MIME type is sniffed from the content, then guessed from the
/// extension. Unknown files are still encoded; decoding them is the
/// crop step's problem.
pub async fn file_to_data_url(path: PathBuf) -> Result<DataUrl> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| StudioError::Upload(format!("{}: {}", path.display(), e)))?;

    if bytes.is_empty() {
        return Err(StudioError::Upload(format!("{} is empty", path.display())));
    }

    let mime_type = sniff_mime_type(&bytes, &path);
    log::info!(
        "📷 Loaded {} ({}, {} KB)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        mime_type,
        bytes.len() / 1024
    );

    Ok(DataUrl::from_bytes(mime_type, &bytes))
}

/// Best-effort MIME type for an image file
pub fn sniff_mime_type(bytes: &[u8], path: &Path) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .or_else(|| image::ImageFormat::from_path(path).ok())
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
