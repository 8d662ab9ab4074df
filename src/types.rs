// Core types shared by the selector, the image ops and the loop.

use std::fmt;

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,      // left edge
    pub y: u32,      // top edge
    pub width: u32,  // columns covered
    pub height: u32, // rows covered
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanned by two opposite corners, in any drag direction.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the whole rectangle lies inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        // u64 so x + width can't wrap
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }

    pub fn offset(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// What came back from one interactive selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Region(Roi), // user confirmed a rectangle (may still be empty)
    Cancelled,   // user backed out; nothing to process
    Closed,      // window went away; stop the loop
}

/// Keys the result screen reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,  // q (or window closed)
    Clear, // c
    Other, // anything else: select again
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalises_drag_direction() {
        let down_right = Roi::from_corners((10, 10), (30, 25));
        let up_left = Roi::from_corners((30, 25), (10, 10));
        assert_eq!(down_right, Roi::new(10, 10, 20, 15));
        assert_eq!(down_right, up_left);
    }

    #[test]
    fn fits_within_checks_far_edges() {
        let roi = Roi::new(80, 80, 20, 20);
        assert!(roi.fits_within(100, 100));
        assert!(!roi.fits_within(99, 100));
        assert!(!Roi::new(u32::MAX, 0, 2, 1).fits_within(100, 100));
    }

    #[test]
    fn display_is_geometry_string() {
        assert_eq!(Roi::new(1, 2, 3, 4).to_string(), "3x4+1+2");
    }
}
