#![allow(clippy::unwrap_used)]
// Loading and saving config files from disk.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use obsfleet_config::{Config, ConfigError, UnitEntry, load_config, save_config};

fn write(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(cfg.defaults, Config::default().defaults);
    assert!(cfg.units.is_empty());
    assert!(matches!(cfg.require_units(), Err(ConfigError::NoUnits)));
}

#[test]
fn full_file_translates_to_fleet_settings() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        r#"
[defaults]
port = 9000
timeout = 3
poll_interval = 10
settle_delay = 7
binning = 2
readout_mode = "RAW8"

[ssh]
user = "observer"
identity_file = "/keys/station"
restart_command = "sudo systemctl restart camera-api"
timeout = 20

[[units]]
name = "north"
host = "10.0.0.11"

[[units]]
name = "south"
host = "10.0.0.12"
port = 8081
"#,
    );

    let cfg = load_config(Some(&path)).unwrap();
    let units = cfg.require_units().unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].port, 9000);
    assert_eq!(units[1].port, 8081);

    let fleet = cfg.fleet_config();
    assert_eq!(fleet.timeout, Duration::from_secs(3));
    assert_eq!(fleet.poll_interval, Duration::from_secs(10));
    assert_eq!(fleet.settle_delay, Duration::from_secs(7));
    assert_eq!(fleet.ping_timeout, Duration::from_secs(1));
    assert_eq!(fleet.baseline.binning, 2);
    assert_eq!(fleet.baseline.readout_mode.as_deref(), Some("RAW8"));
    assert_eq!(fleet.remote.user, "observer");
    assert_eq!(
        fleet.remote.identity_file.as_deref(),
        Some(std::path::Path::new("/keys/station"))
    );
    assert_eq!(fleet.remote.timeout, Duration::from_secs(20));
}

#[test]
fn invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        r#"
[[units]]
name = "A"
host = "10.0.0.11"

[[units]]
name = "A"
host = "10.0.0.12"
"#,
    );
    assert!(matches!(
        load_config(Some(&path)),
        Err(ConfigError::Validation { .. })
    ));

    let path = write(&dir, "[defaults]\ntimeout = \"soon\"\n");
    assert!(matches!(load_config(Some(&path)), Err(ConfigError::Figment(_))));
}

#[test]
fn save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::starter();
    cfg.units.push(UnitEntry {
        name: "B".into(),
        host: "station-b.local".into(),
        port: Some(8090),
    });
    save_config(&cfg, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[[units]]"));
    assert_eq!(load_config(Some(&path)).unwrap(), cfg);
}
