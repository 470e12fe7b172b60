use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::backlight::Backend;
use crate::detector::{DetectorOptions, locate_script};
use crate::error::Error;
use crate::mapping::{Calibration, DEFAULT_FAR_PX, DEFAULT_NEAR_PX};

/// Control the display brightness with the gap between thumb and index finger.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Camera device index
    #[arg(short, long, default_value_t = 0)]
    pub camera: u32,
    /// Requested capture width; the camera may pick the closest it supports
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Requested capture height
    #[arg(long, default_value_t = 480)]
    pub height: u32,
    /// Requested capture frame rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
    /// Window title
    #[arg(long, default_value = "Hand Brightness Control")]
    pub title: String,

    /// Python interpreter with mediapipe installed
    #[arg(long, default_value = "python3")]
    pub python: PathBuf,
    /// Hand detector helper script
    #[arg(long, default_value = "scripts/hand_detect.py")]
    pub detector_script: PathBuf,
    /// Most hands the detector reports per frame
    #[arg(long, default_value_t = 2)]
    pub max_hands: u32,
    #[arg(long, default_value_t = 0.5)]
    pub min_detection_confidence: f32,
    #[arg(long, default_value_t = 0.5)]
    pub min_tracking_confidence: f32,

    /// How brightness is applied
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,
    /// Display or backlight device name (first one found if omitted)
    #[arg(short, long)]
    pub backlight: Option<String>,
    /// Log brightness changes instead of applying them (same as --backend dry-run)
    #[arg(long)]
    pub dry_run: bool,

    /// Fingertip distance (px) mapped to 0%
    #[arg(long, default_value_t = DEFAULT_NEAR_PX)]
    pub near: f64,
    /// Fingertip distance (px) mapped to 100%
    #[arg(long, default_value_t = DEFAULT_FAR_PX)]
    pub far: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// OS brightness API, sysfs if that fails
    Auto,
    /// OS brightness API only (logind / WinAPI)
    System,
    /// Write /sys/class/backlight directly (needs write access)
    Sysfs,
    DryRun,
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Auto => Self::Auto,
            BackendArg::System => Self::System,
            BackendArg::Sysfs => Self::Sysfs,
            BackendArg::DryRun => Self::DryRun,
        }
    }
}

impl Args {
    pub fn backend(&self) -> Backend {
        if self.dry_run { Backend::DryRun } else { self.backend.into() }
    }

    pub fn calibration(&self) -> Result<Calibration, Error> {
        Calibration::new(self.near, self.far)
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            python: self.python.clone(),
            script: locate_script(&self.detector_script),
            max_hands: self.max_hands,
            min_detection_confidence: self.min_detection_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_behaviour() {
        let args = Args::try_parse_from(["hand-brightness"]).unwrap();
        assert_eq!(args.camera, 0);
        assert_eq!(args.backend(), Backend::Auto);
        assert_eq!(args.calibration().unwrap(), Calibration::default());

        let opts = args.detector_options();
        assert_eq!(opts.max_hands, 2);
        assert_eq!(opts.python, PathBuf::from("python3"));
        assert!(opts.script.ends_with("scripts/hand_detect.py"));
        assert!(opts.script.exists());
    }

    #[test]
    fn inverted_calibration_is_rejected() {
        let args = Args::try_parse_from(["hand-brightness", "--near", "200", "--far", "100"]).unwrap();
        assert!(matches!(args.calibration(), Err(Error::Config(_))));
    }

    #[test]
    fn backlight_and_backend_flags() {
        let args = Args::try_parse_from(["hand-brightness", "-b", "intel_backlight", "--backend", "sysfs"]).unwrap();
        assert_eq!(args.backlight.as_deref(), Some("intel_backlight"));
        assert_eq!(args.backend(), Backend::Sysfs);

        let args = Args::try_parse_from(["hand-brightness", "--backend", "system", "--dry-run"]).unwrap();
        assert_eq!(args.backend(), Backend::DryRun);
        let args = Args::try_parse_from(["hand-brightness", "--backend", "dry-run"]).unwrap();
        assert_eq!(args.backend(), Backend::DryRun);
    }
}
