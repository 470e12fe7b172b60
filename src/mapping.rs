// Fingertip distance -> brightness percentage.
// Pure math, no side effects.

use crate::error::Error;
use crate::types::{BrightnessLevel, Landmark};

/// Distance (px) at which thumb and index are considered touching.
pub const DEFAULT_NEAR_PX: f64 = 15.0;
/// Distance (px) at which the fingers are considered fully spread.
pub const DEFAULT_FAR_PX: f64 = 220.0;

/// Calibration endpoints for the linear mapping.
/// These are raw pixel distances: no correction for hand size or distance to camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    near: f64,
    far: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { near: DEFAULT_NEAR_PX, far: DEFAULT_FAR_PX }
    }
}

impl Calibration {
    pub fn new(near: f64, far: f64) -> Result<Self, Error> {
        if !(near.is_finite() && far.is_finite()) || near < 0.0 || near >= far {
            return Err(Error::Config(format!(
                "calibration needs 0 <= near < far, got near={near} far={far}"
            )));
        }
        Ok(Self { near, far })
    }

    /// Map a pixel distance onto 0..=100, clamped at both ends and rounded.
    pub fn brightness_for(&self, distance: f64) -> BrightnessLevel {
        if distance <= self.near {
            return BrightnessLevel::MIN;
        }
        if distance >= self.far {
            return BrightnessLevel::MAX;
        }
        let t = (distance - self.near) / (self.far - self.near);
        BrightnessLevel::clamped((t * 100.0).round() as i64)
    }
}

/// Euclidean distance in pixels.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Distance between two landmarks' pixel positions.
pub fn landmark_distance(a: &Landmark, b: &Landmark) -> f64 {
    distance((a.x as f64, a.y as f64), (b.x as f64, b.y as f64))
}
