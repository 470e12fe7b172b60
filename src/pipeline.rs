// The frame loop: read -> mirror -> detect -> map -> backlight -> draw -> present.
// Visual expectation: the mirrored camera feed with hand skeletons, and while a
// hand is visible the thumb/index line plus a "Brightness: N%" readout.

use std::time::{Duration, Instant};

use crate::backlight::BrightnessSink;
use crate::detector::HandDetector;
use crate::draw::draw_feedback;
use crate::error::Error;
use crate::mapping::{Calibration, landmark_distance};
use crate::types::{BrightnessLevel, FrameBuffer};
use crate::vision::{extract_landmarks, fingertips};

/// How long each iteration waits on the keyboard after presenting.
pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Where frames come from. `None` means the stream is over.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<FrameBuffer>;
    fn release(&mut self);
}

/// Where annotated frames go, and where the exit key is read.
pub trait Display {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error>;
    /// True once the user asked to quit.
    fn poll_exit(&mut self, timeout: Duration) -> bool;
    fn close(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// Detection, mapping, backlight and overlay for one already-mirrored frame.
/// Returns the applied level, or `None` when no thumb/index pair was found.
pub fn process_frame<H, B>(
    frame: &mut FrameBuffer,
    detector: &mut H,
    sink: &mut B,
    calibration: &Calibration,
) -> Result<Option<BrightnessLevel>, Error>
where
    H: HandDetector,
    B: BrightnessSink,
{
    let hands = detector.detect(&frame.to_rgb_image())?;
    let landmarks = extract_landmarks(frame, &hands);
    let Some((thumb, index)) = fingertips(&landmarks) else {
        return Ok(None);
    };

    let distance = landmark_distance(&thumb, &index);
    let level = calibration.brightness_for(distance);
    log::debug!("fingertip distance {distance:.1}px -> {}%", level.percent());

    sink.apply(level)?;
    draw_feedback(frame, &thumb, &index, level);
    Ok(Some(level))
}

/// Owns the capture source and the window for the lifetime of the loop.
/// Both are released exactly once: by `run` on a normal stop, or by `Drop`
/// when an iteration fails part-way.
pub struct Session<S: FrameSource, D: Display> {
    source: S,
    display: D,
    calibration: Calibration,
    state: LoopState,
}

impl<S: FrameSource, D: Display> Session<S, D> {
    pub fn new(source: S, display: D, calibration: Calibration) -> Self {
        Self { source, display, calibration, state: LoopState::Running }
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until end of stream or the exit key. Errors from the detector,
    /// backlight or window stop the loop and are returned.
    pub fn run<H, B>(&mut self, detector: &mut H, sink: &mut B) -> Result<(), Error>
    where
        H: HandDetector,
        B: BrightnessSink,
    {
        let mut last_fps_time = Instant::now();
        let mut frames_this_second: u32 = 0;

        while self.state == LoopState::Running {
            let Some(mut frame) = self.source.next_frame() else {
                log::info!("end of stream");
                self.state = LoopState::Stopping;
                break;
            };

            frame.mirror_horizontal();
            process_frame(&mut frame, detector, sink, &self.calibration)?;
            self.display.present(&frame)?;

            if self.display.poll_exit(KEY_POLL_TIMEOUT) {
                log::info!("exit requested");
                self.state = LoopState::Stopping;
            }

            frames_this_second += 1;
            let elapsed = last_fps_time.elapsed();
            if elapsed >= Duration::from_secs(1) {
                log::info!("FPS: {:.1}", frames_this_second as f32 / elapsed.as_secs_f32());
                frames_this_second = 0;
                last_fps_time = Instant::now();
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Release capture and window. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopping;
        self.source.release();
        self.display.close();
        self.state = LoopState::Stopped;
        log::info!("stopped");
    }
}

impl<S: FrameSource, D: Display> Drop for Session<S, D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
