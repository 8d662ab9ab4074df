// Image ops for one selection: trace an outline around the extracted
// foreground, then paste it back into the full image.
// Visual expectation: a thick green line hugs the subject, and the subject
// replaces what was under it while its black surroundings stay see-through.
use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::trace;

use crate::error::Error;
use crate::types::Roi;

/// Overlay pixels whose gray level is at or below this count as background.
pub const MASK_THRESHOLD: u8 = 10;

/// Tuned constants for the outline heuristic. Not derived from image content.
#[derive(Clone, Debug)]
pub struct OutlineStyle {
    pub blur_sigma: f32,     // sigma of a 29x29 Gaussian kernel
    pub threshold: u8,       // channel value a pixel must exceed to survive
    pub threshold_value: u8, // intensity given to survivors
    pub canny_low: f32,
    pub canny_high: f32,
    pub color: Rgba<u8>,
    pub thickness: u32, // stroke width in pixels
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            blur_sigma: kernel_sigma(29),
            threshold: 251,
            threshold_value: 150,
            canny_low: 30.0,
            canny_high: 60.0,
            color: Rgba([0, 255, 0, 255]),
            thickness: 15,
        }
    }
}

/// Sigma a Gaussian of odd size `ksize` gets when none is given explicitly.
fn kernel_sigma(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Outline the foreground of `fg` with the default style.
pub fn draw_outline(fg: &RgbaImage) -> RgbaImage {
    draw_outline_with(fg, &OutlineStyle::default())
}

/// Returns a copy of `fg` with the outermost contours of its bright/opaque
/// region stroked in `style.color`. `fg` itself is never touched.
pub fn draw_outline_with(fg: &RgbaImage, style: &OutlineStyle) -> RgbaImage {
    let mut out = fg.clone();
    let (w, h) = fg.dimensions();
    if w == 0 || h == 0 {
        return out;
    }

    // 1) Smooth away speckle so only large shapes produce edges.
    let blurred = gaussian_blur_f32(fg, style.blur_sigma);

    // 2) Binary threshold. Alpha takes part only if the image has transparency,
    //    otherwise an opaque crop would "survive" everywhere.
    let has_alpha = fg.pixels().any(|p| p[3] < u8::MAX);
    let thresholded = GrayImage::from_fn(w, h, |x, y| {
        let px = blurred.get_pixel(x, y);
        let channels = if has_alpha { &px.0[..] } else { &px.0[..3] };
        if channels.iter().any(|&c| c > style.threshold) {
            Luma([style.threshold_value])
        } else {
            Luma([0])
        }
    });

    // 3) Edge map, 4) outermost contours only.
    let edges = canny(&thresholded, style.canny_low, style.canny_high);
    let contours = find_contours::<i32>(&edges);

    // 5) Thick stroke: stamp a disc on every border point.
    let radius = (style.thickness / 2) as i32;
    let mut drawn = 0usize;
    for contour in contours.iter().filter(|c| c.parent.is_none()) {
        for point in &contour.points {
            draw_filled_circle_mut(&mut out, (point.x, point.y), radius, style.color);
        }
        drawn += 1;
    }
    trace!(contours = contours.len(), outer = drawn, "outline drawn");

    out
}

/// Paste `overlay` into `target` with its top-left corner at `offset`.
/// Near-black overlay pixels are treated as transparent: the target pixel
/// stays (plus the tiny overlay value, saturating). Every other overlay
/// pixel replaces the target's colour; alpha never drops below the target's,
/// so soft matte edges can't punch holes into an opaque image. Nothing
/// outside the overlay's rectangle changes.
pub fn composite(target: &mut RgbaImage, overlay: &RgbaImage, offset: (u32, u32)) -> Result<(), Error> {
    let (x, y) = offset;
    let area = Roi::new(x, y, overlay.width(), overlay.height());
    if !area.fits_within(target.width(), target.height()) {
        return Err(Error::InvalidRegion {
            roi: area,
            reason: "overlay extends past the target image",
        });
    }

    for (ox, oy, src) in overlay.enumerate_pixels() {
        let dst = target.get_pixel_mut(x + ox, y + oy);
        *dst = if is_background(src) {
            dst.map2(src, |a, b| a.saturating_add(b))
        } else {
            Rgba([src[0], src[1], src[2], dst[3].max(src[3])])
        };
    }
    Ok(())
}

/// Inverted binary mask test: gray <= threshold means "keep the target".
#[inline]
fn is_background(px: &Rgba<u8>) -> bool {
    px.to_luma()[0] <= MASK_THRESHOLD
}
