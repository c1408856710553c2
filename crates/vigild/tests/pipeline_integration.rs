//! End-to-end pipeline tests: queue -> parser -> alert machine -> panel
//! and actuator, driven tick by tick through the `Driver`.

use std::time::Duration;

use vigil_core::{AlertState, AnimationPhase, RawMessage, TransportKind};
use vigild::actuator::{ActuatorCall, RecordingActuator};
use vigild::config::DaemonConfig;
use vigild::driver::Driver;
use vigild::queue::{event_queue, QueuePusher};

// ============================================================================
// Constants
// ============================================================================

/// One 60Hz tick, as the driver computes it from the default config.
const TICK: Duration = Duration::from_nanos(16_666_667);

// ============================================================================
// Test Helpers
// ============================================================================

struct TestPipeline {
    driver: Driver,
    pusher: QueuePusher,
    calls: std::sync::Arc<std::sync::Mutex<Vec<ActuatorCall>>>,
}

impl TestPipeline {
    fn new(cfg: DaemonConfig) -> Self {
        let (pusher, drain) = event_queue(cfg.tick.queue_capacity);
        let actuator = RecordingActuator::new();
        let calls = actuator.calls();
        let driver = Driver::new(&cfg, drain, Box::new(actuator));
        Self {
            driver,
            pusher,
            calls,
        }
    }

    fn with_defaults() -> Self {
        Self::new(DaemonConfig::default())
    }

    fn push_broker(&self, payload: &str) {
        self.pusher.push(RawMessage::new(
            "ld6002/fall_status",
            payload,
            TransportKind::Broker,
        ));
    }

    fn push_serial(&self, payload: &str) {
        self.pusher
            .push(RawMessage::new("/dev/ttyUSB0", payload, TransportKind::Serial));
    }

    fn tick(&mut self) {
        self.driver.tick(TICK);
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.driver.tick(TICK);
        }
    }

    fn recorded(&self) -> Vec<ActuatorCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn full_episode_from_broker_message() {
    let mut pipeline = TestPipeline::with_defaults();

    pipeline.push_broker("Human fall detected!");
    pipeline.tick();

    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Alerting { .. }
    ));
    assert_eq!(pipeline.driver.panel().phase(), AnimationPhase::Showing);

    // Display duration 5s at 60Hz: the 300th tick starts recovery.
    pipeline.ticks(298);
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Alerting { .. }
    ));
    pipeline.tick();
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Recovering { .. }
    ));

    // Fall transition 0.2s: 12 more ticks back to idle.
    pipeline.ticks(12);
    assert_eq!(pipeline.driver.alert_state(), AlertState::Idle);

    let calls = pipeline.recorded();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], ActuatorCall::Show(_)));
    assert_eq!(calls[1], ActuatorCall::FallPose);
    assert_eq!(calls[2], ActuatorCall::StandPose);
    assert_eq!(calls[3], ActuatorCall::Hide);
}

#[test]
fn stand_command_cuts_alert_short() {
    let mut pipeline = TestPipeline::with_defaults();

    pipeline.push_broker("FALL");
    pipeline.tick();
    pipeline.ticks(30);

    pipeline.push_serial("STAND");
    pipeline.tick();

    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Recovering { .. }
    ));
    assert!(pipeline.recorded().contains(&ActuatorCall::StandPose));
}

#[test]
fn repeated_fall_extends_single_episode() {
    let mut pipeline = TestPipeline::with_defaults();

    pipeline.push_broker("fall");
    pipeline.tick();
    pipeline.ticks(150);

    pipeline.push_broker("fall");
    pipeline.tick();

    // Still one episode: exactly one fall pose requested so far.
    let fall_poses = pipeline
        .recorded()
        .iter()
        .filter(|c| **c == ActuatorCall::FallPose)
        .count();
    assert_eq!(fall_poses, 1);

    // The hold restarted: a full display duration runs from here.
    pipeline.ticks(298);
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Alerting { .. }
    ));
    pipeline.tick();
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Recovering { .. }
    ));
}

#[test]
fn overflow_drops_newest_and_keeps_alert_order() {
    let mut cfg = DaemonConfig::default();
    cfg.tick.queue_capacity = 4;
    let mut pipeline = TestPipeline::new(cfg);

    // Four falls fill the queue; the stand overflows and is dropped.
    for _ in 0..4 {
        pipeline.push_broker("fall");
    }
    pipeline.push_serial("STAND");
    assert_eq!(pipeline.pusher.dropped(), 1);

    pipeline.tick();

    // The dropped stand never reached the machine.
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Alerting { .. }
    ));
}

#[test]
fn telemetry_flows_past_the_alert_machine() {
    let mut pipeline = TestPipeline::with_defaults();
    let telemetry = pipeline.driver.watch_telemetry();

    pipeline.push_serial("Temp *C = 21.50\t\tHum. % = 48.00");
    pipeline.push_serial("FALL");
    pipeline.tick();

    // Telemetry recorded, and the command in the same batch still lands.
    let reading = telemetry.borrow().expect("reading");
    assert!((reading.temperature_c - 21.5).abs() < 0.001);
    assert!(matches!(
        pipeline.driver.alert_state(),
        AlertState::Alerting { .. }
    ));
}

#[test]
fn unknown_chatter_never_disturbs_idle() {
    let mut pipeline = TestPipeline::with_defaults();

    for payload in ["hello", "42", "{\"ok\":true}", "noise level high"] {
        pipeline.push_broker(payload);
    }
    pipeline.ticks(10);

    assert_eq!(pipeline.driver.alert_state(), AlertState::Idle);
    assert!(pipeline.recorded().is_empty());
    assert_eq!(pipeline.driver.panel().phase(), AnimationPhase::Hidden);
}

#[test]
fn panel_completes_cycle_with_machine() {
    let mut pipeline = TestPipeline::with_defaults();

    pipeline.push_broker("fall");
    pipeline.tick();

    // Grow at speed 2.0 takes 0.5s (about 30 ticks), then the panel
    // holds while the machine alerts, hides after its own hold.
    pipeline.ticks(40);
    assert_eq!(pipeline.driver.panel().phase(), AnimationPhase::Visible);
    assert_eq!(pipeline.driver.panel().scale(), 1.0);

    // Run well past display + hold + hide.
    pipeline.ticks(700);
    assert_eq!(pipeline.driver.alert_state(), AlertState::Idle);
    assert_eq!(pipeline.driver.panel().phase(), AnimationPhase::Hidden);
}
