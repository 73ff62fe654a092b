// Sensor cooling endpoints.

use crate::camera::CameraClient;
use crate::camera::models;
use crate::error::Error;

impl CameraClient {
    /// `GET get_ccdtemperature` -- live sensor temperature in °C.
    pub async fn get_temperature(&self) -> Result<f64, Error> {
        models::as_f64(&self.get_value("get_ccdtemperature").await?)
    }

    /// `GET get_setccdtemperature` -- cooling set-point in °C.
    pub async fn get_target_temperature(&self) -> Result<f64, Error> {
        models::as_f64(&self.get_value("get_setccdtemperature").await?)
    }

    pub async fn set_target_temperature(&self, celsius: f64) -> Result<(), Error> {
        self.set_value("set_setccdtemperature", celsius).await
    }

    pub async fn get_cooler_on(&self) -> Result<bool, Error> {
        models::as_bool(&self.get_value("get_cooleron").await?)
    }

    pub async fn set_cooler_on(&self, on: bool) -> Result<(), Error> {
        self.set_value("set_cooleron", on).await
    }

    /// `GET get_coolerpower` -- cooler duty in percent.
    pub async fn get_cooler_power(&self) -> Result<f64, Error> {
        models::as_f64(&self.get_value("get_coolerpower").await?)
    }

    pub async fn can_set_cooler_on(&self) -> Result<bool, Error> {
        models::as_bool(&self.get_value("get_cansetcooleron").await?)
    }

    pub async fn can_set_temperature(&self) -> Result<bool, Error> {
        models::as_bool(&self.get_value("get_cansetccdtemperature").await?)
    }

    pub async fn can_get_cooler_power(&self) -> Result<bool, Error> {
        models::as_bool(&self.get_value("get_cangetcoolerpower").await?)
    }
}
