// Region selection: the pure parts.
// The window side (drawing the rubber band, reading the mouse) lives in draw.rs;
// here we only track the drag, map window pixels to image pixels and crop.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::Error;
use crate::types::Roi;

/// Cut `roi` out of `image`. Returns the sub-image and its top-left offset.
pub fn crop_roi(image: &RgbaImage, roi: Roi) -> Result<(RgbaImage, (u32, u32)), Error> {
    if roi.is_empty() {
        return Err(Error::InvalidRegion { roi, reason: "selection has zero area" });
    }
    if !roi.fits_within(image.width(), image.height()) {
        return Err(Error::InvalidRegion { roi, reason: "selection extends past the image" });
    }
    let sub = imageops::crop_imm(image, roi.x, roi.y, roi.width, roi.height).to_image();
    Ok((sub, roi.offset()))
}

/// Follows one left-button drag.
/// Press anchors a corner, holding moves the other, release freezes the box.
#[derive(Clone, Debug, Default)]
pub struct DragTracker {
    anchor: Option<(u32, u32)>,
    current: (u32, u32),
    dragging: bool,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample: pointer position (None when off-window) and button state.
    pub fn update(&mut self, pos: Option<(u32, u32)>, button_down: bool) {
        if !button_down {
            self.dragging = false;
            return;
        }
        let Some(pos) = pos else { return };
        if !self.dragging {
            self.anchor = Some(pos);
            self.dragging = true;
        }
        self.current = pos;
    }

    /// The rectangle dragged so far, if the button was ever pressed.
    pub fn rect(&self) -> Option<Roi> {
        self.anchor.map(|a| Roi::from_corners(a, self.current))
    }
}

/// How an image is shown inside a window of bounded size.
/// Images are shrunk to fit, never enlarged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    image: (u32, u32),
    display: (u32, u32),
}

impl Viewport {
    pub fn fit(image: (u32, u32), max_display: (u32, u32)) -> Self {
        let (iw, ih) = (image.0.max(1), image.1.max(1));
        let scale = (max_display.0 as f64 / iw as f64)
            .min(max_display.1 as f64 / ih as f64)
            .min(1.0);
        let dw = ((iw as f64 * scale).round() as u32).max(1);
        let dh = ((ih as f64 * scale).round() as u32).max(1);
        Self { image: (iw, ih), display: (dw, dh) }
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.display
    }

    pub fn is_scaled(&self) -> bool {
        self.display != self.image
    }

    /// Window pixel -> image pixel, clamped so the far edge is reachable.
    pub fn to_image(&self, pos: (f32, f32)) -> (u32, u32) {
        let map = |v: f32, display: u32, image: u32| -> u32 {
            let scaled = (v.max(0.0) as f64 * image as f64 / display as f64).round();
            (scaled as u32).min(image)
        };
        (map(pos.0, self.display.0, self.image.0), map(pos.1, self.display.1, self.image.1))
    }

    /// Image rectangle -> window rectangle, for drawing the rubber band.
    pub fn to_display(&self, roi: Roi) -> Roi {
        let sx = self.display.0 as f64 / self.image.0 as f64;
        let sy = self.display.1 as f64 / self.image.1 as f64;
        let scale = |v: u32, s: f64| (v as f64 * s).round() as u32;
        Roi::new(scale(roi.x, sx), scale(roi.y, sy), scale(roi.width, sx), scale(roi.height, sy))
    }

    /// The frame that goes to the window.
    pub fn render(&self, image: &RgbaImage) -> RgbaImage {
        if image.dimensions() == self.display {
            image.clone()
        } else {
            imageops::resize(image, self.display.0, self.display.1, FilterType::Triangle)
        }
    }
}
