// Core types shared by every stage of the frame loop.

use image::{Rgb, RgbImage};

/// Number of landmarks the detector reports per hand.
pub const HAND_LANDMARKS: usize = 21;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A frame filled with a single color.
    #[cfg(test)]
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Flip left/right in place so on-screen motion follows the physical hand.
    pub fn mirror_horizontal(&mut self) {
        if self.width == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.reverse();
        }
    }

    /// Unpack into an RGB image for the detector. The frame itself is left untouched.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.pixels[y as usize * self.width + x as usize];
            Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8])
        })
    }
}

/// Detector output: a position normalized to [0,1] of the frame size.
/// Values outside that range do happen and are passed through as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

/// All 21 landmarks of one detected hand, in the detector's topology order.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub landmarks: [NormalizedPoint; HAND_LANDMARKS],
}

/// A landmark id together with its pixel position in the (mirrored) frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

/// Backlight percentage, always within 0..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BrightnessLevel(u8);

impl BrightnessLevel {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Clamp any integer into the valid percentage range.
    pub fn clamped(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}
