/// Image handling module
///
/// This module handles:
/// - `data:` URL encoding of in-memory images (data_url.rs)
/// - Reading picked files (encode.rs)
/// - Center-cropping to the selected aspect ratio (crop.rs)
/// - Saving the generated result (export.rs)

pub mod crop;
pub mod data_url;
pub mod encode;
pub mod export;
