// One error type for the whole pipeline.
// Every variant states *which* collaborator went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Pushing a frame to the window failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Hand detector start error: {0}")]
    DetectorSpawn(String),
    #[error("Hand detector I/O error: {0}")]
    DetectorIo(#[from] std::io::Error),
    #[error("Hand detector protocol error: {0}")]
    DetectorProtocol(String),
    #[error("Brightness control error: {0}")]
    Brightness(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
