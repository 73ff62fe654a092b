// Camera HTTP client
//
// Wraps `reqwest::Client` with per-camera URL construction and envelope
// unwrapping. Endpoint groups (settings, cooling, capture, focuser) are
// implemented as inherent methods in sibling files to keep this module
// focused on transport mechanics.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::camera::models::{SetValue, ValueResponse, WireValue};
use crate::error::Error;
use crate::transport;

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// HTTP client for a single camera on a unit.
///
/// Cheap to construct: the underlying `reqwest::Client` is shared with the
/// `UnitClient` it came from.
#[derive(Debug, Clone)]
pub struct CameraClient {
    http: reqwest::Client,
    base_url: Url,
    index: usize,
    timeout: Duration,
}

impl CameraClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, index: usize, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            index,
            timeout,
        }
    }

    /// Index of the camera on its unit.
    pub fn index(&self) -> usize {
        self.index
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/camera/{index}/{endpoint}`.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("camera/{}/{endpoint}", self.index))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET an endpoint and return the raw `value` of its envelope.
    pub(crate) async fn get_value(&self, endpoint: &str) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
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

        let envelope: ValueResponse<Value> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;
        Ok(envelope.value)
    }

    /// GET an endpoint with query parameters and return the raw body.
    pub(crate) async fn get_bytes(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Bytes, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("GET {} {:?}", url, query);

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;
        let resp = transport::check_status(resp).await?;
        resp.bytes()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))
    }

    /// POST a JSON body to an endpoint. The response body is ignored.
    pub(crate) async fn post_json(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))
            .json(body)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.timeout))?;
        let resp = transport::check_status(resp).await?;

        if tracing::enabled!(tracing::Level::TRACE) {
            let text = resp.text().await.unwrap_or_default();
            trace!(body = %text, "POST response");
        }
        Ok(())
    }

    /// POST `{ "value": "<text>" }` to a set endpoint.
    pub(crate) async fn set_value(&self, endpoint: &str, value: impl WireValue) -> Result<(), Error> {
        self.post_json(
            endpoint,
            &SetValue {
                value: value.to_wire(),
            },
        )
        .await
    }

    /// POST `{ "value": "" }` to an action endpoint that takes no argument.
    pub(crate) async fn trigger(&self, endpoint: &str) -> Result<(), Error> {
        self.set_value(endpoint, "").await
    }
}
