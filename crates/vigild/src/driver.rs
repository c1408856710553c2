//! The fixed-tick consumer loop.
//!
//! Owns everything on the consumer side of the event queue: once per
//! tick it drains the queue, parses each payload with the match mode
//! configured for its transport, feeds commands to the alert state
//! machine, routes the resulting intents to the panel animator and the
//! scene actuator, and advances the panel animation. Telemetry lines are
//! peeled off before command parsing and only update a latest-reading
//! snapshot.
//!
//! Nothing in the tick body blocks: transport I/O, retries, and waits
//! all live in the adapter tasks.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vigil_core::{AlertState, Command, Intent, TelemetryReading, TransportKind};
use vigil_protocol::{parse, parse_telemetry, MatchMode};

use crate::actuator::SceneActuator;
use crate::alert::AlertMachine;
use crate::config::DaemonConfig;
use crate::panel::PanelAnimator;
use crate::queue::QueueDrain;

/// The consumer-side driver.
pub struct Driver {
    queue: QueueDrain,
    machine: AlertMachine,
    panel: PanelAnimator,
    actuator: Box<dyn SceneActuator>,
    broker_mode: MatchMode,
    serial_mode: MatchMode,
    telemetry_tx: watch::Sender<Option<TelemetryReading>>,
}

impl Driver {
    /// Builds a driver from configuration, the queue's consumer half,
    /// and the host's actuator.
    pub fn new(cfg: &DaemonConfig, queue: QueueDrain, actuator: Box<dyn SceneActuator>) -> Self {
        let (telemetry_tx, _) = watch::channel(None);
        Self {
            queue,
            machine: AlertMachine::new(&cfg.alert),
            panel: PanelAnimator::new(&cfg.alert),
            actuator,
            broker_mode: cfg.broker.match_mode,
            serial_mode: cfg.serial.match_mode,
            telemetry_tx,
        }
    }

    /// Current alert state.
    pub fn alert_state(&self) -> AlertState {
        self.machine.state()
    }

    /// The panel animator (phase and scale for the host renderer).
    pub fn panel(&self) -> &PanelAnimator {
        &self.panel
    }

    /// Latest telemetry reading, if any has arrived.
    pub fn watch_telemetry(&self) -> watch::Receiver<Option<TelemetryReading>> {
        self.telemetry_tx.subscribe()
    }

    /// Runs one tick: drain, parse, transition, animate, actuate.
    pub fn tick(&mut self, delta: Duration) {
        let batch = self.queue.drain_all();
        let mut commands = Vec::with_capacity(batch.len());

        for msg in batch {
            if let Some(reading) = parse_telemetry(&msg.payload) {
                info!(
                    source = %msg.source,
                    temperature_c = reading.temperature_c,
                    humidity_pct = reading.humidity_pct,
                    "Telemetry reading"
                );
                let _ = self.telemetry_tx.send(Some(reading));
                continue;
            }

            match parse(&msg.payload, self.mode_for(msg.origin)) {
                Command::Unknown(raw) => {
                    debug!(source = %msg.source, payload = %raw, "Unrecognized payload ignored");
                }
                command => commands.push(command),
            }
        }

        for intent in self.machine.tick(delta, &commands) {
            self.panel.apply(&intent);
            self.dispatch(&intent);
        }
        self.panel.tick(delta);
    }

    fn mode_for(&self, origin: TransportKind) -> MatchMode {
        match origin {
            TransportKind::Broker => self.broker_mode,
            TransportKind::Serial => self.serial_mode,
        }
    }

    fn dispatch(&mut self, intent: &Intent) {
        match intent {
            Intent::ShowAlert(text) => self.actuator.show_alert(text),
            Intent::HideAlert => self.actuator.hide_alert(),
            Intent::EnterFallPose => self.actuator.enter_fall_pose(),
            Intent::EnterStandPose => self.actuator.enter_stand_pose(),
        }
    }
}

/// Spawns the tick loop at the configured rate.
///
/// Ticks with a fixed delta (the configured period); the host loop owns
/// the cadence. Stops when the cancellation token fires.
pub fn spawn_driver_task(
    mut driver: Driver,
    period: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<Driver> {
    tokio::spawn(async move {
        let mut tick = interval(period);

        info!(
            period_ms = period.as_secs_f64() * 1000.0,
            "Driver tick loop started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Driver tick loop shutting down");
                    break;
                }

                _ = tick.tick() => {
                    driver.tick(period);
                }
            }
        }

        debug!(dropped_total = driver.queue.dropped(), "Driver tick loop completed");
        driver
    })
}
