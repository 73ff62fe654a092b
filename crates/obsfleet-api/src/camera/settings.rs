// Exposure, gain, offset, binning and readout-mode endpoints.

use crate::camera::CameraClient;
use crate::camera::models::{self, CameraResolution};
use crate::error::Error;

/// Largest binning factor a unit may report.
pub const MAX_BINNING: u32 = 64;

impl CameraClient {
    /// `POST init_camera` -- connect the camera and open a session.
    pub async fn init_camera(&self) -> Result<(), Error> {
        self.trigger("init_camera").await
    }

    /// `GET get_status` -- the device's opaque state label (`IDLE`, `SAVE`, ...).
    pub async fn get_status(&self) -> Result<String, Error> {
        let value = self.get_value("get_status").await?;
        models::status_label(&value)
    }

    /// `GET get_exposure` -- exposure time in seconds.
    pub async fn get_exposure(&self) -> Result<f64, Error> {
        models::as_f64(&self.get_value("get_exposure").await?)
    }

    /// `POST set_exposure` -- exposure time in seconds.
    pub async fn set_exposure(&self, seconds: f64) -> Result<(), Error> {
        self.set_value("set_exposure", seconds).await
    }

    pub async fn get_gain(&self) -> Result<i64, Error> {
        models::as_i64(&self.get_value("get_gain").await?)
    }

    pub async fn set_gain(&self, gain: i64) -> Result<(), Error> {
        self.set_value("set_gain", gain).await
    }

    pub async fn get_offset(&self) -> Result<i64, Error> {
        models::as_i64(&self.get_value("get_offset").await?)
    }

    pub async fn set_offset(&self, offset: i64) -> Result<(), Error> {
        self.set_value("set_offset", offset).await
    }

    /// `POST set_binx` -- symmetric binning factor.
    pub async fn set_binning(&self, factor: u32) -> Result<(), Error> {
        self.set_value("set_binx", factor).await
    }

    /// `GET get_maxbinx`. Values outside `1..=MAX_BINNING` are rejected.
    pub async fn get_max_binning(&self) -> Result<u32, Error> {
        let max = models::as_i64(&self.get_value("get_maxbinx").await?)?;
        u32::try_from(max)
            .ok()
            .filter(|m| (1..=MAX_BINNING).contains(m))
            .ok_or_else(|| Error::Deserialization {
                message: format!("max binning must be between 1 and {MAX_BINNING}"),
                body: max.to_string(),
            })
    }

    /// Every binning factor the camera accepts, `1..=max`.
    pub async fn get_binning_options(&self) -> Result<Vec<u32>, Error> {
        let max = self.get_max_binning().await?;
        Ok((1..=max).collect())
    }

    /// `GET get_readoutmodes` -- pixel formats the sensor offers.
    pub async fn get_readout_modes(&self) -> Result<Vec<String>, Error> {
        let value = self.get_value("get_readoutmodes").await?;
        match value {
            serde_json::Value::Array(items) => Ok(items.iter().map(models::as_string).collect()),
            other => Err(Error::Deserialization {
                message: "expected a list of readout modes".into(),
                body: other.to_string(),
            }),
        }
    }

    /// `GET get_readoutmode_str`.
    pub async fn get_readout_mode(&self) -> Result<String, Error> {
        Ok(models::as_string(&self.get_value("get_readoutmode_str").await?))
    }

    /// `POST set_readoutmode_str`.
    pub async fn set_readout_mode(&self, mode: &str) -> Result<(), Error> {
        self.set_value("set_readoutmode_str", mode).await
    }

    /// Sensor dimensions from `get_numx` / `get_numy`.
    pub async fn get_resolution(&self) -> Result<CameraResolution, Error> {
        let (x, y) = tokio::join!(self.get_value("get_numx"), self.get_value("get_numy"));
        let width = models::as_i64(&x?)?;
        let height = models::as_i64(&y?)?;
        let to_u32 = |v: i64| {
            u32::try_from(v).map_err(|_| Error::Deserialization {
                message: "resolution out of range".into(),
                body: v.to_string(),
            })
        };
        Ok(CameraResolution {
            width: to_u32(width)?,
            height: to_u32(height)?,
        })
    }
}
