// Per-camera API client modules
//
// Covers everything under `/camera/{index}/`. Reads come back wrapped in
// the `{ "value": ... }` envelope; writes post `{ "value": "<text>" }`.

pub mod capture;
pub mod client;
pub mod cooling;
pub mod focuser;
pub mod models;
pub mod settings;

pub use client::CameraClient;
