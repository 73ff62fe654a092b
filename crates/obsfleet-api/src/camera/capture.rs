// Capture and image retrieval endpoints.

use bytes::Bytes;

use crate::camera::CameraClient;
use crate::camera::models::{ImageFormat, StartSaving};
use crate::error::Error;

impl CameraClient {
    /// `POST start_capturing` -- continuous exposures without saving.
    pub async fn start_capturing(&self) -> Result<(), Error> {
        self.trigger("start_capturing").await
    }

    pub async fn stop_capturing(&self) -> Result<(), Error> {
        self.trigger("stop_capturing").await
    }

    /// `POST start_saving` -- capture `number` frames into `dir_name`.
    pub async fn start_saving(&self, request: &StartSaving) -> Result<(), Error> {
        self.post_json("start_saving", request).await
    }

    pub async fn stop_saving(&self) -> Result<(), Error> {
        self.trigger("stop_saving").await
    }

    /// `GET get_last_image?format=jpg|raw` -- the most recent frame.
    pub async fn get_last_image(&self, format: ImageFormat) -> Result<Bytes, Error> {
        let format = format.to_string();
        self.get_bytes("get_last_image", &[("format", format.as_str())])
            .await
    }
}
