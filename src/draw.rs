// Window + software drawing utilities.
// Visual effects provided here:
// 1) A window that shows the image being edited.
// 2) A crosshair and a rubber-band rectangle while you drag out a selection.
// 3) A tiny 5x7 bitmap font, scaled up, for the on-image prompts.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::debug;

use crate::error::Error;
use crate::select::{DragTracker, Viewport};
use crate::session::Frontend;
use crate::types::{KeyAction, Roi, Selection};

const BAND_COLOR: Rgba<u8> = Rgba([0, 120, 255, 255]);
const CROSSHAIR_COLOR: Rgba<u8> = Rgba([255, 204, 51, 255]);

pub struct Drawer {
    window: Window,     // the on-screen window you see
    viewport: Viewport, // image -> window scaling
    frame: Vec<u32>,    // last frame pushed, re-sent while we wait for keys
}

impl Drawer {
    /// Create a window sized to the (possibly shrunk) image.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, viewport: Viewport) -> Result<Self, Error> {
        let (w, h) = viewport.display_size();
        let mut window = Window::new(title, w as usize, h as usize, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        debug!(width = w, height = h, scaled = viewport.is_scaled(), "window opened");
        Ok(Self {
            window,
            viewport,
            frame: vec![0u32; (w as usize) * (h as usize)],
        })
    }

    /// Push a display-sized image to the screen.
    fn present(&mut self, display: &RgbaImage) -> Result<(), Error> {
        self.frame = pack_rgb(display);
        self.refresh()
    }

    /// Re-send the current frame; this is also what pumps window events.
    fn refresh(&mut self) -> Result<(), Error> {
        let (w, h) = self.viewport.display_size();
        self.window
            .update_with_buffer(&self.frame, w as usize, h as usize)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Mouse position in window pixels, None when off-window.
    fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    fn keys_pressed_once(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }
}

impl Frontend for Drawer {
    /// Drag with the left button, Enter/Space to accept, Esc/C to cancel.
    fn select_roi(&mut self, image: &RgbaImage) -> Result<Selection, Error> {
        let base = self.viewport.render(image);
        let mut drag = DragTracker::new();

        loop {
            if !self.is_open() {
                return Ok(Selection::Closed);
            }

            let pointer = self.mouse_pos();
            drag.update(pointer.map(|p| self.viewport.to_image(p)), self.left_mouse_down());

            let mut frame = base.clone();
            if let Some(rect) = drag.rect() {
                draw_rubber_band(&mut frame, self.viewport.to_display(rect));
            }
            if let Some((mx, my)) = pointer {
                draw_crosshair(&mut frame, mx as i32, my as i32, 12, CROSSHAIR_COLOR);
            }
            self.present(&frame)?;

            for key in self.keys_pressed_once() {
                match key {
                    Key::Enter | Key::Space => {
                        return Ok(Selection::Region(drag.rect().unwrap_or_default()));
                    }
                    Key::Escape | Key::C => return Ok(Selection::Cancelled),
                    _ => {}
                }
            }
        }
    }

    fn show(&mut self, image: &RgbaImage) -> Result<(), Error> {
        let display = self.viewport.render(image);
        self.present(&display)
    }

    /// Blocks until a key is pressed. Closing the window counts as quit.
    fn wait_key(&mut self) -> Result<KeyAction, Error> {
        loop {
            if !self.is_open() {
                return Ok(KeyAction::Quit);
            }
            self.refresh()?;
            if let Some(key) = self.keys_pressed_once().first() {
                return Ok(match key {
                    Key::Q => KeyAction::Quit,
                    Key::C => KeyAction::Clear,
                    _ => KeyAction::Other,
                });
            }
        }
    }
}

/// Pack RGBA into the 0x00RRGGBB words minifb wants (alpha dropped).
fn pack_rgb(image: &RgbaImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}

/* ---------- Overlays: crosshair, selection rectangle ---------- */

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" shape (with a tiny gap at the center) follows your mouse.
fn draw_crosshair(img: &mut RgbaImage, cx: i32, cy: i32, size: i32, color: Rgba<u8>) {
    let seg = |img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32| {
        draw_line_segment_mut(img, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), color);
    };
    seg(img, cx - size, cy, cx - 2, cy);
    seg(img, cx + 2, cy, cx + size, cy);
    seg(img, cx, cy - size, cx, cy - 2);
    seg(img, cx, cy + 2, cx, cy + size);
}

/// Two-pixel outline of the rectangle being dragged.
fn draw_rubber_band(img: &mut RgbaImage, rect: Roi) {
    let outer = Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width.max(1), rect.height.max(1));
    draw_hollow_rect_mut(img, outer, BAND_COLOR);
    if rect.width > 2 && rect.height > 2 {
        let inner = Rect::at(rect.x as i32 + 1, rect.y as i32 + 1).of_size(rect.width - 2, rect.height - 2);
        draw_hollow_rect_mut(img, inner, BAND_COLOR);
    }
}

/* ---------- 5x7 bitmap font (ASCII subset for the prompts) ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Uppercase A..Z
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Lowercase used by the prompts; the rest fall back to uppercase
        'a' => g!(0b00000,0b00000,0b01110,0b00001,0b01111,0b10001,0b01111),
        'c' => g!(0b00000,0b00000,0b01110,0b10000,0b10000,0b10001,0b01110),
        'e' => g!(0b00000,0b00000,0b01110,0b10001,0b11111,0b10000,0b01110),
        'i' => g!(0b00100,0b00000,0b01100,0b00100,0b00100,0b00100,0b01110),
        'l' => g!(0b01100,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'o' => g!(0b00000,0b00000,0b01110,0b10001,0b10001,0b10001,0b01110),
        'r' => g!(0b00000,0b00000,0b10110,0b11001,0b10000,0b10000,0b10000),
        's' => g!(0b00000,0b00000,0b01110,0b10000,0b01110,0b00001,0b11110),
        't' => g!(0b01000,0b01000,0b11100,0b01000,0b01000,0b01001,0b00110),
        'x' => g!(0b00000,0b00000,0b10001,0b01010,0b00100,0b01010,0b10001),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '>' => g!(0b01000,0b00100,0b00010,0b00001,0b00010,0b00100,0b01000),

        c if c.is_ascii_lowercase() => glyph5x7(c.to_ascii_uppercase()),
        _ => None,
    }
}

/// Draw a single 5x7 character with its top-left at (x,y); each glyph bit
/// becomes a `scale` x `scale` block.
fn draw_char_5x7(img: &mut RgbaImage, x: i32, y: i32, ch: char, scale: u32, color: Rgba<u8>) {
    let Some(rows) = glyph5x7(ch) else { return };
    let s = scale as i32;
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..5 {
            if (rowbits & (1 << (4 - rx))) != 0 {
                let block = Rect::at(x + rx * s, y + ry as i32 * s).of_size(scale, scale);
                draw_filled_rect_mut(img, block, color);
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs, top-left at (x,y).
/// Visual: each glyph is 5x7 blocks with one block of spacing.
pub fn draw_text_5x7(img: &mut RgbaImage, mut x: i32, y: i32, text: &str, scale: u32, color: Rgba<u8>) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(img, x, y, ch, scale, color);
        x += 6 * scale as i32; // 5 blocks glyph width + 1 block spacing
    }
}

/// Height in pixels of a line drawn at `scale`.
pub fn text_height(scale: u32) -> u32 {
    7 * scale.max(1)
}
