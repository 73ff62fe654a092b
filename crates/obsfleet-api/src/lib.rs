// obsfleet-api: Async Rust client for the camera unit control API

pub mod camera;
pub mod error;
pub mod transport;
pub mod unit;

pub use camera::models::{CameraResolution, ImageFormat, StartSaving};
pub use camera::CameraClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use unit::UnitClient;
