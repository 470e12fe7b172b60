// Display backlight control.
// Every call writes through; there is no debouncing or caching of the last level.
//
// Backends: the OS brightness API (logind on Linux, WinAPI on Windows, through the
// `brightness` crate), raw sysfs writes, or a dry run that only logs.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::BrightnessLevel;

pub const SYSFS_BACKLIGHT_ROOT: &str = "/sys/class/backlight";

pub trait BrightnessSink {
    /// Set the display to `level` percent. Failures are returned, never swallowed.
    fn apply(&mut self, level: BrightnessLevel) -> Result<(), Error>;
}

impl<T: BrightnessSink + ?Sized> BrightnessSink for Box<T> {
    fn apply(&mut self, level: BrightnessLevel) -> Result<(), Error> {
        (**self).apply(level)
    }
}

/// Which backend `open_sink` should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// OS API first, sysfs when that is unavailable.
    Auto,
    System,
    Sysfs,
    DryRun,
}

/// Open the sink for `backend`. `device` names the display/backlight; the first one found otherwise.
pub fn open_sink(backend: Backend, device: Option<&str>) -> Result<Box<dyn BrightnessSink>, Error> {
    open_with(
        backend,
        || SystemBacklight::open(device).map(|s| Box::new(s) as Box<dyn BrightnessSink>),
        || SysfsBacklight::discover(SYSFS_BACKLIGHT_ROOT, device).map(|s| Box::new(s) as Box<dyn BrightnessSink>),
    )
}

type Opened = Result<Box<dyn BrightnessSink>, Error>;

fn open_with(backend: Backend, system: impl FnOnce() -> Opened, sysfs: impl FnOnce() -> Opened) -> Opened {
    match backend {
        Backend::DryRun => Ok(Box::new(DryRunBacklight::default())),
        Backend::System => system(),
        Backend::Sysfs => sysfs(),
        Backend::Auto => system().or_else(|sys_err| {
            log::warn!("{sys_err}; falling back to sysfs");
            sysfs().map_err(|sysfs_err| {
                Error::Brightness(format!("no usable backlight ({sys_err}; {sysfs_err})"))
            })
        }),
    }
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
mod system {
    use brightness::blocking::{Brightness, BrightnessDevice, brightness_devices};

    use super::BrightnessSink;
    use crate::error::Error;
    use crate::types::BrightnessLevel;

    /// Display brightness through the OS: logind on Linux (no root needed), WinAPI on Windows.
    pub struct SystemBacklight {
        device: BrightnessDevice,
        name: String,
    }

    impl SystemBacklight {
        pub fn open(name: Option<&str>) -> Result<Self, Error> {
            for device in brightness_devices() {
                let device = match device {
                    Ok(device) => device,
                    Err(e) => {
                        log::warn!("skipping brightness device: {e}");
                        continue;
                    }
                };
                let Ok(device_name) = device.device_name() else { continue };
                if name.is_none_or(|wanted| wanted == device_name) {
                    log::info!("system brightness device {device_name}");
                    return Ok(Self { device, name: device_name });
                }
            }
            Err(Error::Brightness(match name {
                Some(wanted) => format!("system brightness device {wanted} not found"),
                None => "no system brightness devices".into(),
            }))
        }
    }

    impl BrightnessSink for SystemBacklight {
        fn apply(&mut self, level: BrightnessLevel) -> Result<(), Error> {
            self.device
                .set(level.percent() as u32)
                .map_err(|e| Error::Brightness(format!("{}: {e}", self.name)))
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod system {
    use super::BrightnessSink;
    use crate::error::Error;
    use crate::types::BrightnessLevel;

    pub struct SystemBacklight;

    impl SystemBacklight {
        pub fn open(_name: Option<&str>) -> Result<Self, Error> {
            Err(Error::Brightness("no system brightness API on this platform".into()))
        }
    }

    impl BrightnessSink for SystemBacklight {
        fn apply(&mut self, _level: BrightnessLevel) -> Result<(), Error> {
            Err(Error::Brightness("no system brightness API on this platform".into()))
        }
    }
}

pub use system::SystemBacklight;

/// Linux backlight under `/sys/class/backlight/<device>`.
pub struct SysfsBacklight {
    brightness_path: PathBuf,
    max_brightness: u64,
}

impl SysfsBacklight {
    /// Open a device directory; reads `max_brightness` once.
    pub fn open(device_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = device_dir.as_ref();
        let max_path = dir.join("max_brightness");
        let raw = fs::read_to_string(&max_path)
            .map_err(|e| Error::Brightness(format!("{}: {e}", max_path.display())))?;
        let max_brightness: u64 = raw
            .trim()
            .parse()
            .map_err(|e| Error::Brightness(format!("{}: {e}", max_path.display())))?;
        if max_brightness == 0 {
            return Err(Error::Brightness(format!("{} reports zero", max_path.display())));
        }

        log::info!("backlight {} (max {max_brightness})", dir.display());
        Ok(Self { brightness_path: dir.join("brightness"), max_brightness })
    }

    /// Open `name` under `root`, or the first device there (by name) when `name` is None.
    pub fn discover(root: impl AsRef<Path>, name: Option<&str>) -> Result<Self, Error> {
        let root = root.as_ref();
        if let Some(name) = name {
            return Self::open(root.join(name));
        }

        let mut devices: Vec<PathBuf> = fs::read_dir(root)
            .map_err(|e| Error::Brightness(format!("{}: {e}", root.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        devices.sort();
        let first = devices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Brightness(format!("no backlight devices in {}", root.display())))?;
        Self::open(first)
    }

    /// Raw device value for a percentage.
    fn raw_value(&self, level: BrightnessLevel) -> u64 {
        (level.percent() as u64 * self.max_brightness + 50) / 100
    }
}

impl BrightnessSink for SysfsBacklight {
    fn apply(&mut self, level: BrightnessLevel) -> Result<(), Error> {
        let raw = self.raw_value(level);
        fs::write(&self.brightness_path, raw.to_string())
            .map_err(|e| Error::Brightness(format!("{}: {e}", self.brightness_path.display())))
    }
}

/// Logs the level instead of touching hardware.
#[derive(Default)]
pub struct DryRunBacklight {
    last: Option<BrightnessLevel>,
}

impl BrightnessSink for DryRunBacklight {
    fn apply(&mut self, level: BrightnessLevel) -> Result<(), Error> {
        match self.last.replace(level) {
            Some(prev) if prev == level => log::debug!("[dry-run] brightness {}%", level.percent()),
            _ => log::info!("[dry-run] brightness -> {}%", level.percent()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_device(root: &Path, name: &str, max: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("max_brightness"), max).unwrap();
        fs::write(dir.join("brightness"), "0").unwrap();
        dir
    }

    #[test]
    fn writes_scaled_value() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = fake_device(tmp.path(), "intel_backlight", "1515\n");
        let mut bl = SysfsBacklight::open(&dir).unwrap();

        bl.apply(BrightnessLevel::clamped(50)).unwrap();
        assert_eq!(fs::read_to_string(dir.join("brightness")).unwrap(), "758");
        bl.apply(BrightnessLevel::MAX).unwrap();
        assert_eq!(fs::read_to_string(dir.join("brightness")).unwrap(), "1515");
        bl.apply(BrightnessLevel::MIN).unwrap();
        assert_eq!(fs::read_to_string(dir.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn discover_picks_named_or_first_device() {
        let tmp = tempfile::tempdir().unwrap();
        fake_device(tmp.path(), "b_panel", "100");
        fake_device(tmp.path(), "a_panel", "10");

        let first = SysfsBacklight::discover(tmp.path(), None).unwrap();
        assert_eq!(first.max_brightness, 10);
        let named = SysfsBacklight::discover(tmp.path(), Some("b_panel")).unwrap();
        assert_eq!(named.max_brightness, 100);
    }

    #[test]
    fn failures_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(SysfsBacklight::discover(tmp.path(), None), Err(Error::Brightness(_))));

        fake_device(tmp.path(), "zero", "0");
        assert!(SysfsBacklight::open(tmp.path().join("zero")).is_err());

        let dir = fake_device(tmp.path(), "gone", "100");
        let mut bl = SysfsBacklight::open(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(bl.apply(BrightnessLevel::MAX), Err(Error::Brightness(_))));
    }

    /// Opener that records it was tried and then succeeds or fails.
    fn opener(tried: &std::cell::Cell<bool>, ok: bool) -> impl FnOnce() -> Opened + '_ {
        move || {
            tried.set(true);
            if ok {
                Ok(Box::new(DryRunBacklight::default()))
            } else {
                Err(Error::Brightness("unavailable".into()))
            }
        }
    }

    #[test]
    fn auto_prefers_system_backend() {
        let (sys, sysfs) = (Default::default(), Default::default());
        assert!(open_with(Backend::Auto, opener(&sys, true), opener(&sysfs, true)).is_ok());
        assert!(sys.get());
        assert!(!sysfs.get());
    }

    #[test]
    fn auto_falls_back_to_sysfs() {
        let (sys, sysfs) = (Default::default(), Default::default());
        assert!(open_with(Backend::Auto, opener(&sys, false), opener(&sysfs, true)).is_ok());
        assert!(sys.get() && sysfs.get());

        let (sys, sysfs) = (Default::default(), Default::default());
        let err = open_with(Backend::Auto, opener(&sys, false), opener(&sysfs, false));
        assert!(matches!(err, Err(Error::Brightness(_))));
    }

    #[test]
    fn explicit_backends_do_not_fall_back() {
        let (sys, sysfs) = (Default::default(), Default::default());
        assert!(open_with(Backend::System, opener(&sys, false), opener(&sysfs, true)).is_err());
        assert!(!sysfs.get());

        let (sys, sysfs) = (Default::default(), Default::default());
        assert!(open_with(Backend::Sysfs, opener(&sys, true), opener(&sysfs, true)).is_ok());
        assert!(!sys.get() && sysfs.get());

        let (sys, sysfs) = (Default::default(), Default::default());
        assert!(open_with(Backend::DryRun, opener(&sys, false), opener(&sysfs, false)).is_ok());
        assert!(!sys.get() && !sysfs.get());
    }

    #[test]
    fn dry_run_remembers_last_level_and_boxes() {
        let mut sink = DryRunBacklight::default();
        assert_eq!(sink.last, None);
        let mut boxed: Box<dyn BrightnessSink> = Box::new(DryRunBacklight::default());
        boxed.apply(BrightnessLevel::MAX).unwrap();
        sink.apply(BrightnessLevel::clamped(30)).unwrap();
        assert_eq!(sink.last, Some(BrightnessLevel::clamped(30)));
    }
}
