#![allow(clippy::unwrap_used)]
// Integration tests for `FleetController` against wiremock units with stub
// ping and remote-command seams.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use obsfleet_core::{
    CaptureCount, CaptureKind, CaptureRequest, Command, CommandResult, CoreError, FleetConfig,
    FleetController, PassOutcome, Pinger, PollerState, Reachability, ReconcileOutcome,
    RecoveryOutcome, RemoteDispatcher, RemoteOutput, Unit,
};

// ── Stubs ───────────────────────────────────────────────────────────

struct StubPinger {
    answers: bool,
    calls: AtomicUsize,
}

impl StubPinger {
    fn new(answers: bool) -> Arc<Self> {
        Arc::new(Self {
            answers,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Pinger for StubPinger {
    fn ping<'a>(&'a self, _host: &'a str, _wait: Duration) -> BoxFuture<'a, bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { self.answers })
    }
}

#[derive(Default)]
struct StubDispatcher {
    fail: bool,
    commands: std::sync::Mutex<Vec<String>>,
}

impl StubDispatcher {
    fn count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

impl RemoteDispatcher for StubDispatcher {
    fn dispatch<'a>(
        &'a self,
        unit: &'a Unit,
        command: &'a str,
    ) -> BoxFuture<'a, Result<RemoteOutput, CoreError>> {
        self.commands.lock().unwrap().push(command.to_owned());
        Box::pin(async move {
            if self.fail {
                Err(CoreError::DispatchFailed {
                    unit: unit.name.clone(),
                    reason: "connection refused".into(),
                })
            } else {
                Ok(RemoteOutput {
                    stdout: format!("ran {command}"),
                    stderr: String::new(),
                })
            }
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn test_config() -> FleetConfig {
    FleetConfig {
        timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(100),
        settle_delay: Duration::from_millis(10),
        ..FleetConfig::default()
    }
}

fn unit_for(server: &MockServer, name: &str) -> Unit {
    let addr = server.address();
    Unit::new(name, addr.ip().to_string(), addr.port())
}

fn controller(
    server: &MockServer,
    pinger: Arc<StubPinger>,
    dispatcher: Arc<StubDispatcher>,
) -> FleetController {
    FleetController::with_collaborators(
        test_config(),
        vec![unit_for(server, "A")],
        pinger,
        dispatcher,
    )
    .unwrap()
}

fn camera_path(index: usize, endpoint: &str) -> String {
    format!("/camera/{index}/{endpoint}")
}

async fn mount_cameras(server: &MockServer, cameras: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cameras": cameras })))
        .mount(server)
        .await;
}

async fn mount_read(server: &MockServer, index: usize, endpoint: &str, value: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(camera_path(index, endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
        .mount(server)
        .await;
}

async fn mount_post(server: &MockServer, index: usize, endpoint: &str) {
    Mock::given(method("POST"))
        .and(path(camera_path(index, endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

/// A camera that answers every reconciliation call.
async fn mount_healthy_camera(server: &MockServer, index: usize) {
    mount_post(server, index, "init_camera").await;
    mount_post(server, index, "set_binx").await;
    mount_post(server, index, "set_readoutmode_str").await;
    mount_read(server, index, "get_cooleron", json!(true)).await;
    mount_read(server, index, "get_setccdtemperature", json!(-10.0)).await;
    mount_read(server, index, "get_ccdtemperature", json!(-9.5)).await;
    mount_read(server, index, "get_exposure", json!(1.0)).await;
    mount_read(server, index, "get_gain", json!(100)).await;
    mount_read(server, index, "get_status", json!({ "state": "IDLE" })).await;
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

// ── Load / reconciliation ───────────────────────────────────────────

#[tokio::test]
async fn test_load_reconciles_reachable_unit() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0", "cam1"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    let snapshot = ctrl.load().await;

    assert_eq!(snapshot.len(), 1);
    let unit = &snapshot[0];
    assert_eq!(unit.reachability, Reachability::Reachable);
    assert_eq!(unit.state.cameras, vec!["cam0".to_owned(), "cam1".to_owned()]);
    assert_eq!(unit.state.active_camera, Some(0));
    assert_eq!(unit.state.observed.exposure_us, Some(1_000_000));
    assert_eq!(unit.state.observed.gain, Some(100));
    assert_eq!(unit.state.observed.cooler_on, Some(true));
    assert_eq!(unit.state.observed.temperature_c, Some(-9.5));
    assert_eq!(unit.state.observed.target_temperature_c, Some(-10.0));
    assert!(unit.state.observed.status.as_ref().unwrap().is_idle());
    assert!(unit.state.last_updated.is_some());
    assert!(unit.state.is_consistent());
}

#[tokio::test]
async fn test_capture_issues_exactly_one_start_saving() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0", "cam1"])).await;
    mount_healthy_camera(&server, 0).await;

    Mock::given(method("POST"))
        .and(path(camera_path(0, "start_saving")))
        .and(body_json(json!({ "number": 5, "dir_name": "light", "prefix": "light_A" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    let request =
        CaptureRequest::for_kind(CaptureCount::new(5).unwrap(), CaptureKind::Light, "light_A")
            .unwrap();
    let result = ctrl.execute("A", Command::StartSaving(request)).await.unwrap();
    assert_eq!(result, CommandResult::Ok);
    assert_eq!(ctrl.unit("A").unwrap().state.pending_capture_count.get(), 5);
}

#[tokio::test]
async fn test_network_unreachable_skips_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cameras": ["cam0"] })))
        .expect(0)
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(false), Arc::default());
    let snapshot = ctrl.load().await;

    let state = &snapshot[0].state;
    assert!(!state.pingable);
    assert!(!state.reachable);
    assert!(state.cameras.is_empty());
    assert!(state.observed.is_unknown());
    assert_eq!(snapshot[0].reachability, Reachability::NetworkUnreachable);
}

#[tokio::test]
async fn test_application_unreachable_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    let snapshot = ctrl.load().await;

    assert_eq!(snapshot[0].reachability, Reachability::ApplicationUnreachable);
    assert_eq!(snapshot[0].state.active_camera, None);
    assert!(snapshot[0].state.observed.is_unknown());
}

#[tokio::test]
async fn test_partial_read_failure_only_clears_that_field() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;

    // Higher priority than the healthy mock below.
    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_ccdtemperature")))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    let outcome = ctrl.reconcile_unit("A").await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Reconciled { failed_reads: 1 });

    let state = ctrl.unit("A").unwrap().state;
    assert_eq!(state.observed.cooler_on, Some(true));
    assert_eq!(state.observed.temperature_c, None);
    assert_eq!(state.active_camera, Some(0));
}

#[tokio::test]
async fn test_init_failure_leaves_no_session() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    Mock::given(method("POST"))
        .and(path(camera_path(0, "init_camera")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    let snapshot = ctrl.load().await;

    let state = &snapshot[0].state;
    assert!(state.reachable);
    assert_eq!(state.active_camera, None);
    assert!(state.observed.is_unknown());
    assert_eq!(requests_to(&server, "/camera/0/get_gain").await, 0);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    let first = ctrl.unit("A").unwrap().state;

    ctrl.reconcile_unit("A").await.unwrap();
    let second = ctrl.unit("A").unwrap().state;

    assert_eq!(first.observed, second.observed);
    assert_eq!(first.active_camera, second.active_camera);
    assert_eq!(first.cameras, second.cameras);
}

#[tokio::test]
async fn test_load_unit_only_touches_that_unit() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = FleetController::with_collaborators(
        test_config(),
        vec![unit_for(&server, "A"), Unit::new("B", "10.255.255.1", 8080)],
        StubPinger::new(true),
        Arc::new(StubDispatcher::default()),
    )
    .unwrap();

    let outcome = ctrl.load_unit("A").await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Reconciled { failed_reads: 0 });
    assert_eq!(ctrl.unit("A").unwrap().reachability, Reachability::Reachable);
    assert_eq!(ctrl.unit("B").unwrap().reachability, Reachability::NetworkUnreachable);
    assert!(matches!(ctrl.load_unit("Z").await, Err(CoreError::UnitNotFound { .. })));
}

#[tokio::test]
async fn test_ping_all_keeps_existing_sessions() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    ctrl.ping_all().await;

    assert_eq!(requests_to(&server, "/cameras_list").await, 2);
    assert_eq!(requests_to(&server, "/camera/0/init_camera").await, 1);
    assert_eq!(ctrl.unit("A").unwrap().state.active_camera, Some(0));
}

#[tokio::test]
async fn test_select_camera() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0", "cam1"])).await;
    mount_healthy_camera(&server, 0).await;
    mount_healthy_camera(&server, 1).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    let err = ctrl.select_camera("A", 2).await.unwrap_err();
    assert!(matches!(err, CoreError::CameraOutOfRange { index: 2, available: 2, .. }));

    let outcome = ctrl.select_camera("A", 1).await.unwrap();
    assert!(outcome.is_reconciled());
    let state = ctrl.unit("A").unwrap().state;
    assert_eq!(state.active_camera, Some(1));
    assert_eq!(state.active_camera_id(), Some("cam1"));
    assert_eq!(requests_to(&server, "/camera/1/init_camera").await, 1);
}

// ── Recovery ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restart_inactive_recovers_with_one_dispatch_and_one_reprobe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let dispatcher = Arc::new(StubDispatcher::default());
    let ctrl = controller(&server, StubPinger::new(true), Arc::clone(&dispatcher));

    let snapshot = ctrl.load().await;
    assert_eq!(snapshot[0].reachability, Reachability::ApplicationUnreachable);

    let results = ctrl.restart_inactive().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].unit, "A");
    assert_eq!(results[0].outcome, RecoveryOutcome::Recovered);

    assert_eq!(dispatcher.count(), 1);
    assert_eq!(
        dispatcher.commands.lock().unwrap()[0],
        "sudo supervisorctl restart gunicorn"
    );
    assert_eq!(requests_to(&server, "/cameras_list").await, 2);

    let state = ctrl.unit("A").unwrap().state;
    assert!(state.reachable);
    assert_eq!(state.active_camera, Some(0));
    assert_eq!(state.observed.exposure_us, Some(1_000_000));
}

#[tokio::test]
async fn test_restart_inactive_reports_failure_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = Arc::new(StubDispatcher::default());
    let ctrl = controller(&server, StubPinger::new(true), Arc::clone(&dispatcher));
    ctrl.load().await;

    let results = ctrl.restart_inactive().await;
    assert_eq!(results[0].outcome, RecoveryOutcome::Failed);
    assert_eq!(dispatcher.count(), 1);
    assert_eq!(requests_to(&server, "/cameras_list").await, 2);
    assert!(!ctrl.unit("A").unwrap().state.reachable);
}

#[tokio::test]
async fn test_restart_inactive_dispatch_failure_leaves_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cameras_list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = Arc::new(StubDispatcher {
        fail: true,
        ..StubDispatcher::default()
    });
    let ctrl = controller(&server, StubPinger::new(true), Arc::clone(&dispatcher));
    let before = ctrl.load().await[0].state.clone();

    let results = ctrl.restart_inactive().await;
    assert!(matches!(results[0].outcome, RecoveryOutcome::DispatchFailed(_)));
    assert_eq!(requests_to(&server, "/cameras_list").await, 1);
    assert_eq!(ctrl.unit("A").unwrap().state, before);
}

#[tokio::test]
async fn test_restart_inactive_ignores_healthy_and_dead_units() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let dispatcher = Arc::new(StubDispatcher::default());
    let ctrl = controller(&server, StubPinger::new(true), Arc::clone(&dispatcher));
    ctrl.load().await;
    assert!(ctrl.restart_inactive().await.is_empty());

    let dead = controller(&server, StubPinger::new(false), Arc::clone(&dispatcher));
    dead.load().await;
    assert!(dead.restart_inactive().await.is_empty());
    assert_eq!(dispatcher.count(), 0);
}

// ── Operator commands ───────────────────────────────────────────────

#[tokio::test]
async fn test_set_exposure_reads_back() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_exposure")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": 2.5 })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_healthy_camera(&server, 0).await;
    Mock::given(method("POST"))
        .and(path(camera_path(0, "set_exposure")))
        .and(body_json(json!({ "value": "2.5" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    let result = ctrl
        .execute("A", Command::SetExposure { secs: 2.5 })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Value(json!(2_500_000)));
    assert_eq!(ctrl.unit("A").unwrap().state.observed.exposure_us, Some(2_500_000));
}

#[tokio::test]
async fn test_failed_read_back_marks_field_unknown() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_gain")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": 100 })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_gain")))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(2)
        .mount(&server)
        .await;
    mount_healthy_camera(&server, 0).await;
    mount_post(&server, 0, "set_gain").await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    assert_eq!(ctrl.unit("A").unwrap().state.observed.gain, Some(100));

    let result = ctrl.execute("A", Command::SetGain { gain: 200 }).await.unwrap();
    assert_eq!(result, CommandResult::Value(serde_json::Value::Null));
    assert_eq!(ctrl.unit("A").unwrap().state.observed.gain, None);
}

#[tokio::test]
async fn test_rejected_write_leaves_state() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;
    Mock::given(method("POST"))
        .and(path(camera_path(0, "set_setccdtemperature")))
        .respond_with(ResponseTemplate::new(422).set_body_string("out of range"))
        .mount(&server)
        .await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    let before = ctrl.unit("A").unwrap().state;

    let err = ctrl
        .execute("A", Command::SetTargetTemperature { celsius: -80.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Rejected { .. }));
    assert_eq!(ctrl.unit("A").unwrap().state, before);
}

#[tokio::test]
async fn test_commands_need_an_open_session() {
    let server = MockServer::start().await;
    let ctrl = controller(&server, StubPinger::new(false), Arc::default());
    ctrl.load().await;

    let err = ctrl.execute("A", Command::StopSaving).await.unwrap_err();
    assert!(matches!(err, CoreError::UnitUnavailable { .. }));

    let err = ctrl.execute("Z", Command::StopSaving).await.unwrap_err();
    assert!(matches!(err, CoreError::UnitNotFound { .. }));
}

#[tokio::test]
async fn test_local_command_runs_without_a_session() {
    let server = MockServer::start().await;
    let ctrl = controller(&server, StubPinger::new(false), Arc::default());
    ctrl.load().await;
    let mut rx = ctrl.subscribe();

    let count = CaptureCount::new(42).unwrap();
    let result = ctrl
        .execute("A", Command::SetCaptureCount(count))
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Ok);
    assert!(rx.has_changed().unwrap());
    let unit = ctrl.unit("A").unwrap();
    assert_eq!(unit.reachability, Reachability::NetworkUnreachable);
    assert_eq!(unit.state.pending_capture_count, count);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_values_never_reach_the_unit() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    let before = requests_to(&server, "/camera/0/set_exposure").await;

    let err = ctrl
        .execute("A", Command::SetExposure { secs: -1.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(requests_to(&server, "/camera/0/set_exposure").await, before);
}

#[tokio::test]
async fn test_capture_count_validation() {
    let server = MockServer::start().await;
    let ctrl = controller(&server, StubPinger::new(false), Arc::default());

    for bad in ["0", "10001", "many"] {
        assert!(ctrl.set_capture_count("A", bad).await.is_err());
        assert_eq!(ctrl.unit("A").unwrap().state.pending_capture_count.get(), 1);
    }

    assert_eq!(ctrl.set_capture_count("A", "10000").await.unwrap().get(), 10_000);
    assert_eq!(ctrl.unit("A").unwrap().state.pending_capture_count.get(), 10_000);
    assert_eq!(ctrl.set_capture_count("A", "1").await.unwrap().get(), 1);
}

#[tokio::test]
async fn test_last_image_and_camera_info() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;
    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_last_image")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;
    mount_read(&server, 0, "get_numx", json!(4144)).await;
    mount_read(&server, 0, "get_numy", json!(2822)).await;
    mount_read(&server, 0, "get_maxbinx", json!(4)).await;
    mount_read(&server, 0, "get_readoutmodes", json!(["RAW8", "RAW16"])).await;
    mount_read(&server, 0, "get_readoutmode_str", json!("RAW16")).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    let image = ctrl.last_image("A", obsfleet_core::ImageFormat::Jpg).await.unwrap();
    assert_eq!(image.as_ref(), &[0xFF, 0xD8, 0xFF]);

    let info = ctrl.camera_info("A").await.unwrap();
    assert_eq!(info.camera, "cam0");
    assert_eq!(info.resolution.unwrap().width, 4144);
    assert_eq!(info.binning_options, Some(vec![1, 2, 3, 4]));
    assert_eq!(info.readout_mode.as_deref(), Some("RAW16"));
    // Not mounted: unknown rather than an error.
    assert_eq!(info.cooler_power, None);
    assert_eq!(info.offset, None);
}

#[tokio::test]
async fn test_send_remote_command() {
    let server = MockServer::start().await;
    let dispatcher = Arc::new(StubDispatcher::default());
    let ctrl = controller(&server, StubPinger::new(true), Arc::clone(&dispatcher));

    let output = ctrl.send_remote_command("A", "uptime").await.unwrap();
    assert_eq!(output.stdout, "ran uptime");
    assert!(ctrl.send_remote_command("A", "  ").await.is_err());
    assert!(matches!(
        ctrl.send_remote_command("Z", "uptime").await,
        Err(CoreError::UnitNotFound { .. })
    ));
    assert_eq!(dispatcher.count(), 1);
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_overlapping_pass_is_skipped() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_status")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": { "state": "SAVE" } }))
                .set_delay(Duration::from_millis(300)),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(ctrl.poll_once(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctrl.poll_once().await
    });

    assert_eq!(first, PassOutcome::Completed { polled: 1, failures: 0 });
    assert_eq!(second, PassOutcome::Skipped);
    assert!(ctrl.unit("A").unwrap().state.observed.status.unwrap().is_saving());
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_known_value() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;

    Mock::given(method("GET"))
        .and(path(camera_path(0, "get_ccdtemperature")))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;

    let outcome = ctrl.poll_once().await;
    assert_eq!(outcome, PassOutcome::Completed { polled: 1, failures: 1 });
    assert_eq!(ctrl.unit("A").unwrap().state.observed.temperature_c, Some(-9.5));
}

#[tokio::test]
async fn test_poller_skips_units_without_session() {
    let server = MockServer::start().await;
    let ctrl = controller(&server, StubPinger::new(false), Arc::default());
    ctrl.load().await;

    let outcome = ctrl.poll_once().await;
    assert_eq!(outcome, PassOutcome::Completed { polled: 0, failures: 0 });
}

#[tokio::test]
async fn test_poller_lifecycle() {
    let server = MockServer::start().await;
    mount_cameras(&server, json!(["cam0"])).await;
    mount_healthy_camera(&server, 0).await;

    let ctrl = controller(&server, StubPinger::new(true), Arc::default());
    ctrl.load().await;
    let after_load = requests_to(&server, "/camera/0/get_status").await;
    let mut rx = ctrl.subscribe();
    rx.borrow_and_update();

    assert_eq!(ctrl.poller_state(), PollerState::Stopped);
    ctrl.start_polling();
    ctrl.start_polling();
    assert_eq!(ctrl.poller_state(), PollerState::Running);

    tokio::time::sleep(Duration::from_millis(350)).await;
    ctrl.shutdown().await;
    assert_eq!(ctrl.poller_state(), PollerState::Stopped);

    let polled = requests_to(&server, "/camera/0/get_status").await - after_load;
    assert!(polled >= 2, "expected at least two passes, saw {polled}");
    assert!(rx.has_changed().unwrap());

    tokio::time::sleep(Duration::from_millis(250)).await;
    let after_shutdown = requests_to(&server, "/camera/0/get_status").await - after_load;
    assert_eq!(polled, after_shutdown);
}
