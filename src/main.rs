// What you SEE:
// • The camera feed, mirrored like a selfie view.
// • Every detected hand gets a grey skeleton with red joints.
// • While a hand is visible, thumb and index tips are joined by a blue line and
//   the display brightness follows their distance (readout top-left).
// • Q or ESC quits.

mod args;
mod backlight;
mod camera;
mod detector;
mod draw;
mod error;
mod mapping;
mod pipeline;
mod types;
mod vision;

use args::Args;
use camera::CameraCapture;
use clap::Parser;
use detector::MediaPipeDetector;
use draw::Drawer;
use error::Error;
use pipeline::Session;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let calibration = args.calibration()?;

    // Backlight and detector first: if either is missing we never open the camera.
    let mut sink = backlight::open_sink(args.backend(), args.backlight.as_deref())?;
    let mut detector = MediaPipeDetector::spawn(&args.detector_options())?;

    /* --- Camera + window setup ---
       Visual: window opens sized to whatever the camera actually delivers. */
    let cam = CameraCapture::new(args.camera, args.width, args.height, args.fps)?;
    let (w, h) = cam.resolution();
    let drawer = Drawer::new(&args.title, w as usize, h as usize)?;

    let mut session = Session::new(cam, drawer, calibration);
    session.run(&mut detector, &mut sink)
}
