// Opens the camera and converts frames into a buffer suitable for the window.
// Visual expectation: each `next_frame()` yields a Vec<u32> where each pixel is
// 0x00RRGGBB, ready to be mirrored, annotated and pushed to the screen.

use crate::error::Error;
use crate::pipeline::FrameSource;
use crate::types::FrameBuffer;

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

// A small wrapper around nokhwa::Camera so the frame loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
    streaming: bool,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution and frame rate.
    /// On success nothing is shown yet; we just hold an open stream.
    pub fn new(index: u32, width: u32, height: u32, fps: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            fps,
        );

        // Ask for RGB frames, taking whatever the device offers closest to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!("camera {index} streaming at {}x{}", actual.width(), actual.height());

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
            streaming: true,
        })
    }

    /// Grab one frame from the camera and convert it to 0x00RRGGBB pixels.
    /// Blocks until the device delivers a frame.
    pub fn grab(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();

        Ok(FrameBuffer {
            width: w as usize,
            height: h as usize,
            pixels,
        })
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// A failed read ends the stream; there is no retry.
    fn next_frame(&mut self) -> Option<FrameBuffer> {
        if !self.streaming {
            return None;
        }
        match self.grab() {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("{e}; treating as end of stream");
                None
            }
        }
    }

    fn release(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        match self.cam.stop_stream() {
            Ok(()) => log::info!("camera released"),
            Err(e) => log::warn!("camera release failed: {e}"),
        }
    }
}
