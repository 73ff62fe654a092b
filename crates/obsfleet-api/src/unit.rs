// Unit-level HTTP client
//
// A unit hosts one control service on a single port. Everything below
// `/camera/{index}/` is delegated to `CameraClient`; this type only covers
// unit-wide endpoints and owns the shared connection pool.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::camera::CameraClient;
use crate::error::Error;
use crate::transport::{self, TransportConfig};

#[derive(Deserialize)]
struct CamerasList {
    #[serde(default)]
    cameras: Vec<serde_json::Value>,
}

/// HTTP client for one unit's control service.
#[derive(Debug, Clone)]
pub struct UnitClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl UnitClient {
    /// Create a new unit client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `http://10.0.0.11:8080`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a unit client with a pre-built `reqwest::Client`.
    ///
    /// Lets every unit in a fleet share one connection pool.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// The service root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client scoped to the camera at `index`.
    pub fn camera(&self, index: usize) -> CameraClient {
        CameraClient::new(self.http.clone(), self.base_url.clone(), index, self.timeout)
    }

    /// `GET /cameras_list` -- identifiers of every camera on the unit.
    ///
    /// Identifiers are opaque; non-string JSON values are rendered to text.
    pub async fn list_cameras(&self) -> Result<Vec<String>, Error> {
        let url = self.base_url.join("cameras_list")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;
        let resp = transport::check_status(resp).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;

        let list: CamerasList =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        Ok(list
            .cameras
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }
}
