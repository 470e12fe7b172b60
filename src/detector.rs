//! Hand landmark detection through a MediaPipe Hands helper process.
//!
//! The helper (`scripts/hand_detect.py`) prints `READY` once loaded. For every
//! frame it reads a little-endian `width, height, channels` header followed by
//! raw RGB bytes, and answers with one JSON line:
//!
//! ```text
//! {"hands":[{"handedness":"Left","score":0.97,"landmarks":[{"x":0.4,"y":0.6,"z":0.0}, ...]}],"error":null}
//! ```

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::RgbImage;
use serde::Deserialize;

use crate::error::Error;
use crate::types::{HAND_LANDMARKS, HandObservation, NormalizedPoint};

/// Anything that turns an RGB image into zero or more hands.
/// Calls are treated as independent even if the backend tracks across frames.
pub trait HandDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandObservation>, Error>;
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    #[serde(default)]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Settings forwarded to the helper on its command line.
#[derive(Clone, Debug)]
pub struct DetectorOptions {
    pub python: PathBuf,
    pub script: PathBuf,
    pub max_hands: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

/// Find a relative helper path: as given (working directory), next to the
/// executable, then in the source checkout. Falls back to the path unchanged.
pub fn locate_script(path: &Path) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let roots: Vec<PathBuf> = exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::from(env!("CARGO_MANIFEST_DIR"))))
        .collect();
    locate_in(path, &roots)
}

fn locate_in(path: &Path, roots: &[PathBuf]) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    roots
        .iter()
        .map(|root| root.join(path))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

pub struct MediaPipeDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl MediaPipeDetector {
    /// Start the helper and wait for its `READY` line.
    pub fn spawn(opts: &DetectorOptions) -> Result<Self, Error> {
        if !opts.script.exists() {
            return Err(Error::DetectorSpawn(format!(
                "helper script not found at {}",
                opts.script.display()
            )));
        }

        log::info!("starting hand detector: {} {}", opts.python.display(), opts.script.display());
        let mut process = Command::new(&opts.python)
            .arg(&opts.script)
            .arg("--max-hands")
            .arg(opts.max_hands.to_string())
            .arg("--min-detection-confidence")
            .arg(opts.min_detection_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(opts.min_tracking_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::DetectorSpawn(format!("{}: {e}", opts.python.display())))?;

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            let _ = process.kill();
            return Err(Error::DetectorSpawn("helper pipes unavailable".into()));
        };
        let mut detector = Self { process, stdin, stdout: BufReader::new(stdout) };

        let ready = detector.read_line()?;
        if ready.trim() != "READY" {
            return Err(Error::DetectorSpawn(format!("expected READY, got {:?}", ready.trim())));
        }
        log::info!("hand detector ready");
        Ok(detector)
    }

    fn read_line(&mut self) -> Result<String, Error> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::DetectorProtocol("helper closed its output".into()));
        }
        Ok(line)
    }
}

impl HandDetector for MediaPipeDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandObservation>, Error> {
        let (w, h) = image.dimensions();
        self.stdin.write_all(&encode_header(w, h))?;
        self.stdin.write_all(image.as_raw())?;
        self.stdin.flush()?;

        let line = self.read_line()?;
        parse_response(&line)
    }
}

impl Drop for MediaPipeDetector {
    fn drop(&mut self) {
        // The helper never exits on its own while stdin is open.
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// `width, height, channels` as little-endian u32s.
fn encode_header(width: u32, height: u32) -> [u8; 12] {
    let mut header = [0u8; 12];
    header[0..4].copy_from_slice(&width.to_le_bytes());
    header[4..8].copy_from_slice(&height.to_le_bytes());
    header[8..12].copy_from_slice(&3u32.to_le_bytes());
    header
}

/// Decode one reply line. Hands in detector order; malformed hands are skipped.
fn parse_response(line: &str) -> Result<Vec<HandObservation>, Error> {
    let result: DetectionResult = serde_json::from_str(line.trim())
        .map_err(|e| Error::DetectorProtocol(format!("bad reply {:?}: {e}", line.trim())))?;

    if let Some(error) = result.error {
        log::warn!("hand detector reported: {error}");
        return Ok(Vec::new());
    }

    let hands: Vec<HandObservation> = result
        .hands
        .into_iter()
        .filter_map(|hand| {
            if hand.landmarks.len() != HAND_LANDMARKS {
                log::warn!("skipping hand with {} landmarks", hand.landmarks.len());
                return None;
            }
            let mut landmarks = [NormalizedPoint::default(); HAND_LANDMARKS];
            for (dst, src) in landmarks.iter_mut().zip(&hand.landmarks) {
                *dst = NormalizedPoint { x: src.x, y: src.y };
            }
            log::trace!("{} hand, score {:.2}", hand.handedness, hand.score);
            Some(HandObservation { landmarks })
        })
        .collect();

    log::debug!("detector found {} hand(s)", hands.len());
    Ok(hands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(n: usize, x: f32) -> String {
        let lms: Vec<String> = (0..n).map(|_| format!(r#"{{"x":{x},"y":0.5,"z":0.0}}"#)).collect();
        format!(r#"{{"handedness":"Right","score":0.9,"landmarks":[{}]}}"#, lms.join(","))
    }

    #[test]
    fn header_is_little_endian_rgb() {
        let h = encode_header(640, 480);
        assert_eq!(&h[0..4], &640u32.to_le_bytes());
        assert_eq!(&h[4..8], &480u32.to_le_bytes());
        assert_eq!(&h[8..12], &[3, 0, 0, 0]);
    }

    #[test]
    fn parses_hands_in_order() {
        let line = format!(r#"{{"hands":[{},{}],"error":null}}"#, hand_json(21, 0.25), hand_json(21, 0.75));
        let hands = parse_response(&line).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].landmarks[8], NormalizedPoint { x: 0.25, y: 0.5 });
        assert_eq!(hands[1].landmarks[4].x, 0.75);
    }

    #[test]
    fn empty_and_error_replies_mean_no_hands() {
        assert!(parse_response(r#"{"hands":[]}"#).unwrap().is_empty());
        assert!(parse_response(r#"{"hands":[],"error":"model failed"}"#).unwrap().is_empty());
    }

    #[test]
    fn short_hands_are_skipped() {
        let line = format!(r#"{{"hands":[{},{}]}}"#, hand_json(5, 0.1), hand_json(21, 0.2));
        let hands = parse_response(&line).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].landmarks[0].x, 0.2);
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        assert!(matches!(parse_response("not json\n"), Err(Error::DetectorProtocol(_))));
    }

    #[test]
    fn missing_script_fails_to_spawn() {
        use crate::args::Args;
        use clap::Parser;

        let args = Args::try_parse_from(["hand-brightness", "--detector-script", "/nonexistent/hand_detect.py"])
            .unwrap();
        let opts = args.detector_options();
        assert_eq!(opts.script, PathBuf::from("/nonexistent/hand_detect.py"));
        assert!(matches!(MediaPipeDetector::spawn(&opts), Err(Error::DetectorSpawn(_))));
    }

    #[test]
    fn helper_is_found_outside_the_working_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let install = tmp.path().join("install");
        std::fs::create_dir_all(install.join("helpers")).unwrap();
        std::fs::write(install.join("helpers/detect_hands_xyz.py"), "").unwrap();
        let rel = Path::new("helpers/detect_hands_xyz.py");
        assert!(!rel.exists());

        let roots = [tmp.path().join("missing"), install.clone()];
        assert_eq!(locate_in(rel, &roots), install.join(rel));
        assert_eq!(locate_in(Path::new("helpers/none.py"), &roots), PathBuf::from("helpers/none.py"));
        assert_eq!(locate_in(Path::new("/abs/x.py"), &roots), PathBuf::from("/abs/x.py"));
    }

    #[test]
    fn bundled_helper_resolves_from_the_checkout() {
        let found = locate_script(Path::new("scripts/hand_detect.py"));
        assert!(found.exists(), "{}", found.display());
    }
}
