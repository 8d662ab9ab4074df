// Loading and saving the RGBA buffers everything else works on.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::trace;

use crate::error::Error;

/// Decode an image file and widen it to 4 channels.
pub fn load(path: &Path) -> Result<RgbaImage, Error> {
    let decoded = image::open(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })?;
    trace!(path = %path.display(), color = ?decoded.color(), "decoded image");
    Ok(decoded.to_rgba8())
}

/// Write `image` to `path`, replacing whatever was there.
/// The format follows the extension; JPEG gets the colour channels only.
pub fn save(image: &RgbaImage, path: &Path) -> Result<(), Error> {
    let written = match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path),
        _ => image.save(path),
    };
    written.map_err(|source| Error::Save {
        path: path.to_path_buf(),
        source,
    })?;
    trace!(path = %path.display(), width = image.width(), height = image.height(), "saved image");
    Ok(())
}
