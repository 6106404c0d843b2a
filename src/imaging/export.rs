/// Saving the generated image to disk

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::data_url::DataUrl;
use crate::error::{Result, StudioError};

/// File extension matching the image's MIME type (png when unknown)
pub fn extension_for(mime_type: &str) -> &'static str {
    image::ImageFormat::from_mime_type(mime_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}

/// Default name offered in the save dialog: `branded-image-<unix millis>.<ext>`
pub fn suggested_file_name(image: &DataUrl, now: DateTime<Utc>) -> String {
    format!(
        "branded-image-{}.{}",
        now.timestamp_millis(),
        extension_for(&image.mime_type)
    )
}

/// Decode the image and write it to `path`
pub async fn save_image(image: DataUrl, path: PathBuf) -> Result<PathBuf> {
    let bytes = image
        .decode()
        .map_err(|e| StudioError::Save(e.to_string()))?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| StudioError::Save(format!("{}: {}", path.display(), e)))?;

    log::info!("💾 Saved {} KB to {}", bytes.len() / 1024, path.display());
    Ok(path)
}
