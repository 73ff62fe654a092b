use serde::Serialize;

/// Two-tier liveness classification of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Reachability {
    /// Ping failed: the station is down or off the network.
    NetworkUnreachable,
    /// Ping succeeded but the control API did not answer. A service restart
    /// may recover it.
    ApplicationUnreachable,
    /// The control API answered.
    Reachable,
}

/// Outcome of one probe. `reachable` implies `pingable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachabilityResult {
    pub pingable: bool,
    pub reachable: bool,
    pub cameras: Vec<String>,
}

impl ReachabilityResult {
    pub fn network_unreachable() -> Self {
        Self {
            pingable: false,
            reachable: false,
            cameras: Vec::new(),
        }
    }

    pub fn application_unreachable() -> Self {
        Self {
            pingable: true,
            reachable: false,
            cameras: Vec::new(),
        }
    }

    pub fn reachable(cameras: Vec<String>) -> Self {
        Self {
            pingable: true,
            reachable: true,
            cameras,
        }
    }

    pub fn classification(&self) -> Reachability {
        classify(self.pingable, self.reachable)
    }
}

pub(crate) fn classify(pingable: bool, reachable: bool) -> Reachability {
    match (pingable, reachable) {
        (_, true) => Reachability::Reachable,
        (true, false) => Reachability::ApplicationUnreachable,
        (false, false) => Reachability::NetworkUnreachable,
    }
}
