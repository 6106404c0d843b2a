/// Session state for one editing run
///
/// Holds everything the UI shows: the upload, its crop, the prompt, the
/// generated result and the busy/error flags. Background work (file reads,
/// cropping, generation) carries a ticket; results with a
/// ticket older than the latest request are dropped, so a reset or a newer
/// request always wins over a late response.

use super::aspect::AspectRatio;
use crate::error::{Result, StudioError};
use crate::imaging::data_url::DataUrl;

/// Where the session is in the upload → crop → generate flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing uploaded yet
    Idle,
    /// A crop is being computed
    Cropping,
    /// Crop available, nothing generated yet
    Ready,
    /// Waiting on the remote model
    Generating,
    /// A generated image is available
    Done,
    /// Last operation failed and nothing is in flight
    Error,
}

/// Inputs for one background crop
#[derive(Debug, Clone, PartialEq)]
pub struct CropJob {
    pub ticket: u64,
    pub source: DataUrl,
    pub ratio: AspectRatio,
}

/// Inputs for one generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub ticket: u64,
    pub image: DataUrl,
    pub prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Encoded upload, as read from disk
    pub original: Option<DataUrl>,
    /// JPEG crop of `original` at `aspect_ratio`
    pub cropped: Option<DataUrl>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    /// Result from the remote model
    pub generated: Option<DataUrl>,
    pub is_loading: bool,
    pub is_cropping: bool,
    pub is_preview_open: bool,
    /// The single user-visible error message
    pub error: Option<StudioError>,
    upload_ticket: u64,
    crop_ticket: u64,
    generation_ticket: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a blank session. Results of requests issued before the reset are ignored.
    pub fn reset(&mut self) {
        let upload_ticket = self.upload_ticket + 1;
        let crop_ticket = self.crop_ticket + 1;
        let generation_ticket = self.generation_ticket + 1;
        *self = Self {
            upload_ticket,
            crop_ticket,
            generation_ticket,
            ..Self::default()
        };
    }

    /// A new file was picked; everything from the previous image goes away.
    /// Returns the ticket the file read must report back with.
    pub fn begin_upload(&mut self) -> u64 {
        self.reset();
        self.upload_ticket
    }

    /// Record a failed file read. Returns false when the read was stale and dropped.
    pub fn upload_failed(&mut self, ticket: u64, error: StudioError) -> bool {
        if ticket != self.upload_ticket {
            return false;
        }
        self.error = Some(error);
        true
    }

    /// Store the encoded upload and start cropping it
    ///
    /// `None` when the read was stale (a reset or a newer upload happened meanwhile).
    pub fn set_original(&mut self, ticket: u64, original: DataUrl) -> Option<CropJob> {
        if ticket != self.upload_ticket {
            return None;
        }
        self.original = Some(original.clone());
        Some(self.start_crop(original))
    }

    /// Change the output ratio; re-crops when an upload exists and the ratio changed
    pub fn select_aspect_ratio(&mut self, ratio: AspectRatio) -> Option<CropJob> {
        if ratio == self.aspect_ratio {
            return None;
        }
        self.aspect_ratio = ratio;
        let source = self.original.clone()?;
        Some(self.start_crop(source))
    }

    fn start_crop(&mut self, source: DataUrl) -> CropJob {
        self.crop_ticket += 1;
        self.is_cropping = true;
        self.error = None;
        CropJob {
            ticket: self.crop_ticket,
            source,
            ratio: self.aspect_ratio,
        }
    }

    /// Apply a crop result. Returns false when the result was stale and dropped.
    pub fn finish_crop(&mut self, ticket: u64, result: Result<DataUrl>) -> bool {
        if ticket != self.crop_ticket {
            return false;
        }
        match result {
            Ok(cropped) => self.cropped = Some(cropped),
            Err(error) => self.error = Some(error),
        }
        self.is_cropping = false;
        true
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Validate inputs and mark a generation as in flight
    ///
    /// Missing crop or blank prompt sets the error. A request already in flight
    /// yields `None` without touching the state.
    pub fn begin_generation(&mut self) -> Option<GenerationJob> {
        if self.is_loading {
            return None;
        }

        let image = match &self.cropped {
            Some(image) if !self.prompt.trim().is_empty() => image.clone(),
            _ => {
                self.error = Some(StudioError::MissingInput);
                return None;
            }
        };

        self.generation_ticket += 1;
        self.is_loading = true;
        self.error = None;
        self.generated = None;
        self.is_preview_open = false;

        Some(GenerationJob {
            ticket: self.generation_ticket,
            image,
            prompt: self.prompt.clone(),
        })
    }

    /// Apply a generation result. Returns false when the result was stale and dropped.
    pub fn finish_generation(&mut self, ticket: u64, result: Result<DataUrl>) -> bool {
        if ticket != self.generation_ticket || !self.is_loading {
            return false;
        }
        match result {
            Ok(image) => self.generated = Some(image),
            Err(error) => self.error = Some(error),
        }
        self.is_loading = false;
        true
    }

    pub fn open_preview(&mut self) {
        if self.generated.is_some() {
            self.is_preview_open = true;
        }
    }

    pub fn close_preview(&mut self) {
        self.is_preview_open = false;
    }

    /// Report a failure that isn't tied to a job (e.g. saving)
    pub fn report(&mut self, error: StudioError) {
        self.error = Some(error);
    }

    /// Prompt editor accepts input
    pub fn prompt_enabled(&self) -> bool {
        self.cropped.is_some() && !self.is_loading
    }

    /// Generate button is clickable
    pub fn can_generate(&self) -> bool {
        self.cropped.is_some() && !self.prompt.is_empty() && !self.is_loading
    }

    /// Download button is clickable
    pub fn can_download(&self) -> bool {
        self.generated.is_some() && !self.is_loading
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Generating
        } else if self.is_cropping {
            Phase::Cropping
        } else if self.error.is_some() {
            Phase::Error
        } else if self.generated.is_some() {
            Phase::Done
        } else if self.cropped.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}
