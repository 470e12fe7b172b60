// Window + software drawing utilities.
// Visual effects provided here:
// 1) A window that shows the mirrored camera image.
// 2) Filled discs, thick lines and panels for the fingertip feedback.
// 3) A tiny 5x7 bitmap font, scaled up for the brightness readout.

use std::thread;
use std::time::Duration;

use crate::error::Error;
use crate::pipeline::Display;
use crate::types::{BrightnessLevel, FrameBuffer, Landmark};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

pub const BLUE: u32 = 0x00_00_00_FF;
pub const GREEN: u32 = 0x00_00_FF_00;
pub const BLACK: u32 = 0x00_00_00_00;

const TIP_RADIUS: i32 = 10;
const TIP_LINE_THICKNESS: i32 = 5;
const PANEL_TOP_LEFT: (i32, i32) = (30, 30);
const PANEL_BOTTOM_RIGHT: (i32, i32) = (350, 100);
const READOUT_BASELINE: (i32, i32) = (40, 80);
const READOUT_SCALE: i32 = 3;

pub struct Drawer {
    window: Option<Window>, // None once closed
}

impl Drawer {
    /// Create a window sized to the camera feed.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        log::info!("window '{title}' opened at {width}x{height}");
        Ok(Self { window: Some(window) })
    }

    fn window_mut(&mut self) -> Result<&mut Window, Error> {
        self.window
            .as_mut()
            .ok_or_else(|| Error::WindowUpdate("window already closed".into()))
    }
}

impl Display for Drawer {
    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image (live video).
    fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window_mut()?
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Wait `timeout`, then report a q/ESC press or a closed window.
    /// Key edges come from the event pump in `present`, so a quick tap is not lost.
    fn poll_exit(&mut self, timeout: Duration) -> bool {
        let Some(window) = self.window.as_ref() else {
            return true;
        };
        thread::sleep(timeout);
        !window.is_open() || is_exit_key_pressed(&window.get_keys_pressed(KeyRepeat::No))
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::info!("window closed");
        }
    }
}

/// q (quit) or ESC among the keys pressed since the last event pump.
pub fn is_exit_key_pressed(pressed: &[Key]) -> bool {
    pressed.iter().any(|k| matches!(k, Key::Q | Key::Escape))
}

/* ---------- Software drawing: pixels, lines, discs, panels ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Off-frame coordinates are dropped silently.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Visit every point of the Bresenham line between (x0,y0) and (x1,y1).
fn for_each_line_point(x0: i32, y0: i32, x1: i32, y1: i32, mut visit: impl FnMut(i32, i32)) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        visit(x0, y0);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Filled disc centered at (cx,cy). Only the part inside the frame is drawn.
pub fn fill_circle(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32) {
    if radius < 0 {
        return;
    }
    let r2 = radius as i64 * radius as i64;
    let x_lo = cx.saturating_sub(radius).max(0);
    let x_hi = cx.saturating_add(radius).min(fb.width as i32 - 1);
    let y_lo = cy.saturating_sub(radius).max(0);
    let y_hi = cy.saturating_add(radius).min(fb.height as i32 - 1);
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let (dx, dy) = (x as i64 - cx as i64, y as i64 - cy as i64);
            if dx * dx + dy * dy <= r2 {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// Clip a segment to the inclusive box `(xmin, ymin, xmax, ymax)` (Liang-Barsky).
/// `None` when nothing of the segment lies inside.
fn clip_segment(
    (ax, ay): (i32, i32),
    (bx, by): (i32, i32),
    (xmin, ymin, xmax, ymax): (i32, i32, i32, i32),
) -> Option<(i32, i32, i32, i32)> {
    if xmin > xmax || ymin > ymax {
        return None;
    }
    let (x0, y0) = (ax as f64, ay as f64);
    let (dx, dy) = (bx as f64 - x0, by as f64 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let edges = [
        (-dx, x0 - xmin as f64),
        (dx, xmax as f64 - x0),
        (-dy, y0 - ymin as f64),
        (dy, ymax as f64 - y0),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 { return None; }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 { return None; }
            t0 = t0.max(t);
        } else {
            if t < t0 { return None; }
            t1 = t1.min(t);
        }
    }
    let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    let ((cx0, cy0), (cx1, cy1)) = (at(t0), at(t1));
    Some((cx0, cy0, cx1, cy1))
}

/// Line of roughly `thickness` pixels: a small disc stamped along the Bresenham path.
/// The path is clipped to the frame (plus the disc radius) first, so far-off endpoints are cheap.
pub fn draw_thick_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: u32) {
    let radius = (thickness / 2).max(0);
    let bounds = (-radius, -radius, fb.width as i32 - 1 + radius, fb.height as i32 - 1 + radius);
    let Some((x0, y0, x1, y1)) = clip_segment((x0, y0), (x1, y1), bounds) else {
        return;
    };
    for_each_line_point(x0, y0, x1, y1, |x, y| {
        if radius == 0 {
            put_pixel(fb, x, y, color);
        } else {
            fill_circle(fb, x, y, radius, color);
        }
    });
}

/// Opaque rectangle, both corners inclusive.
pub fn fill_rect(fb: &mut FrameBuffer, (x0, y0): (i32, i32), (x1, y1): (i32, i32), color: u32) {
    let x_lo = x0.min(x1).max(0);
    let x_hi = x0.max(x1).min(fb.width as i32 - 1);
    let y_lo = y0.min(y1).max(0);
    let y_hi = y0.max(y1).min(fb.height as i32 - 1);
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            put_pixel(fb, x, y, color);
        }
    }
}

/// Readout for the brightness overlay.
pub fn readout_text(level: BrightnessLevel) -> String {
    format!("Brightness: {}%", level.percent())
}

/// Fingertip feedback, in fixed z-order: discs, line, panel, text.
pub fn draw_feedback(fb: &mut FrameBuffer, thumb: &Landmark, index: &Landmark, level: BrightnessLevel) {
    fill_circle(fb, thumb.x, thumb.y, TIP_RADIUS, BLUE);
    fill_circle(fb, index.x, index.y, TIP_RADIUS, BLUE);
    draw_thick_line(fb, thumb.x, thumb.y, index.x, index.y, TIP_LINE_THICKNESS, BLUE);
    fill_rect(fb, PANEL_TOP_LEFT, PANEL_BOTTOM_RIGHT, BLACK);
    let (x, baseline) = READOUT_BASELINE;
    draw_text_5x7(fb, x, baseline - 7 * READOUT_SCALE, &readout_text(level), READOUT_SCALE, GREEN);
}

/* ---------- 5x7 bitmap font (ASCII subset for "Brightness: 100%") ---------- */

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

        // Letters of "Brightness"
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'r' => g!(0b00000,0b00000,0b10110,0b11001,0b10000,0b10000,0b10000),
        'i' => g!(0b00100,0b00000,0b01100,0b00100,0b00100,0b00100,0b01110),
        'g' => g!(0b00000,0b01111,0b10001,0b10001,0b01111,0b00001,0b01110),
        'h' => g!(0b10000,0b10000,0b10110,0b11001,0b10001,0b10001,0b10001),
        't' => g!(0b01000,0b01000,0b11100,0b01000,0b01000,0b01001,0b00110),
        'n' => g!(0b00000,0b00000,0b10110,0b11001,0b10001,0b10001,0b10001),
        'e' => g!(0b00000,0b00000,0b01110,0b10001,0b11111,0b10000,0b01110),
        's' => g!(0b00000,0b00000,0b01110,0b10000,0b01110,0b00001,0b11110),

        // Punctuation: space, colon, percent
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '%' => g!(0b11000,0b11001,0b00010,0b00100,0b01000,0b10011,0b00011),

        _ => None,
    }
}

/// Draw a single 5x7 character with its top-left at (x,y), each bit a `scale`×`scale` block.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..5 {
            if (rowbits & (1 << (4 - rx))) != 0 {
                let (px, py) = (x + rx * scale, y + ry as i32 * scale);
                fill_rect(fb, (px, py), (px + scale - 1, py + scale - 1), color);
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; top-left of the first glyph at (x,y).
/// Each glyph advances 6 cells (5 glyph + 1 spacing) times `scale`.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, color: u32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, scale, color);
        x += 6 * scale;
    }
}
