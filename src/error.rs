// One error type for the whole tool.
// Every variant states *where* things went wrong.
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::types::Roi;

#[derive(Debug, Error)]
pub enum Error {
    // Creating the window failed
    #[error("window init error: {0}")]
    WindowInit(String),

    // Pushing a buffer to the window failed
    #[error("window update error: {0}")]
    WindowUpdate(String),

    // Reading/decoding an image from disk failed
    #[error("failed to load image {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // Encoding/writing an image to disk failed
    #[error("failed to save image {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // The background remover could not be started at all
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // The background remover ran but reported failure
    #[error("`{program}` exited with {status}: {stderr}")]
    ExternalTool {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    // The background remover claimed success but wrote nothing
    #[error("`{program}` produced no output at {}", path.display())]
    MissingOutput { program: String, path: PathBuf },

    // A rectangle that is empty or does not fit the image it refers to
    #[error("invalid region {roi}: {reason}")]
    InvalidRegion { roi: Roi, reason: &'static str },

    // Setting up the scratch directory failed
    #[error("working directory error: {0}")]
    Workspace(#[from] std::io::Error),
}

impl Error {
    /// Errors the interaction loop can shrug off and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidRegion { .. })
    }
}
