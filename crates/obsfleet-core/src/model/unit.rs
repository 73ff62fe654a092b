use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Default port of a unit's control service.
pub const DEFAULT_PORT: u16 = 8080;

/// One remote station, identified by its unique name.
///
/// Immutable after the directory is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Unit {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// Root URL of the control service, `http://{host}:{port}/`.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Url::parse(&format!("http://{host}:{}/", self.port)).map_err(|e| CoreError::Config {
            message: format!("invalid address for unit {}: {e}", self.name),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_host_and_port() {
        let unit = Unit::new("A", "10.0.0.11", DEFAULT_PORT);
        assert_eq!(unit.base_url().unwrap().as_str(), "http://10.0.0.11:8080/");
    }

    #[test]
    fn base_url_brackets_ipv6() {
        let unit = Unit::new("B", "fe80::1", 9000);
        assert_eq!(unit.base_url().unwrap().as_str(), "http://[fe80::1]:9000/");
    }

    #[test]
    fn base_url_rejects_garbage_host() {
        let unit = Unit::new("C", "bad host", 8080);
        assert!(matches!(unit.base_url(), Err(CoreError::Config { .. })));
    }
}
