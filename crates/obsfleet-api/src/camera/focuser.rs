// Focuser endpoints. The focuser hangs off the camera's control service.

use serde_json::Value;

use crate::camera::CameraClient;
use crate::error::Error;

impl CameraClient {
    pub async fn connect_focuser(&self) -> Result<(), Error> {
        self.set_value("set_focuserconnect", true).await
    }

    /// `POST set_focuserposition` -- absolute step position.
    pub async fn move_focuser(&self, position: i64) -> Result<(), Error> {
        self.set_value("set_focuserposition", position).await
    }

    /// `GET get_focuserstatus` -- returned as-is; the shape is firmware-defined.
    pub async fn focuser_status(&self) -> Result<Value, Error> {
        self.get_value("get_focuserstatus").await
    }
}
