/// Error types for the studio
///
/// Every variant's `Display` text is what the user sees in the error banner.
/// Technical details travel in the payload and only go to the log.

use thiserror::Error;

/// Errors that can surface in the UI
///
/// `Clone` so it can ride inside iced messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StudioError {
    /// Reading or encoding the picked file failed
    #[error("Could not upload the file. Please try again.")]
    Upload(String),

    /// Decoding, cropping or re-encoding the upload failed
    #[error("Could not crop the image. Please try a different image.")]
    Crop(String),

    /// Generate was requested without a crop or with a blank prompt
    #[error("Please upload an image and enter a description.")]
    MissingInput,

    /// No API key was configured at all
    #[error("No API key configured. Set GEMINI_API_KEY and restart the app.")]
    MissingApiKey,

    /// The remote model rejected the API key
    #[error("Invalid API Key. Please check your configuration.")]
    InvalidApiKey,

    /// A string that should have been a `data:` URL wasn't
    #[error("Invalid data URL format")]
    InvalidDataUrl,

    /// Anything else that went wrong talking to the model
    #[error("Failed to generate the image. The model may be unable to process this request. Please try a different image or prompt.")]
    Generation(String),

    /// Writing the downloaded result failed
    #[error("Could not save the image: {0}")]
    Save(String),

    /// The config file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StudioError {
    /// Technical detail for logging, if the variant carries any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Upload(d) | Self::Crop(d) | Self::Generation(d) | Self::Save(d) | Self::Config(d) => {
                Some(d.as_str())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
