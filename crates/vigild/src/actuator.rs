//! The outward seam to rendering/physics code.
//!
//! These four calls are the only ones the ingestion core makes into the
//! scene. The daemon binary uses the logging implementation; hosts that
//! embed the driver supply their own.

use std::sync::{Arc, Mutex};

use tracing::info;

/// Receiver of scene side effects.
pub trait SceneActuator: Send {
    /// Put the monitored subject into the fall pose (and, if the host
    /// does physics, apply the fall impulse).
    fn enter_fall_pose(&mut self);

    /// Restore the monitored subject to the stand pose.
    fn enter_stand_pose(&mut self);

    /// Show the warning panel with the given text.
    fn show_alert(&mut self, text: &str);

    /// Hide the warning panel.
    fn hide_alert(&mut self);
}

/// Actuator that logs every call; used by the headless daemon.
pub struct LoggingActuator;

impl SceneActuator for LoggingActuator {
    fn enter_fall_pose(&mut self) {
        info!(actuator = "scene", "Enter fall pose");
    }

    fn enter_stand_pose(&mut self) {
        info!(actuator = "scene", "Enter stand pose");
    }

    fn show_alert(&mut self, text: &str) {
        info!(actuator = "panel", text = %text, "Show alert");
    }

    fn hide_alert(&mut self) {
        info!(actuator = "panel", "Hide alert");
    }
}

/// One recorded actuator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCall {
    FallPose,
    StandPose,
    Show(String),
    Hide,
}

/// Actuator that records calls for assertions in tests.
#[derive(Default)]
pub struct RecordingActuator {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded calls; stays valid after the actuator
    /// moves into a driver.
    pub fn calls(&self) -> Arc<Mutex<Vec<ActuatorCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: ActuatorCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SceneActuator for RecordingActuator {
    fn enter_fall_pose(&mut self) {
        self.record(ActuatorCall::FallPose);
    }

    fn enter_stand_pose(&mut self) {
        self.record(ActuatorCall::StandPose);
    }

    fn show_alert(&mut self, text: &str) {
        self.record(ActuatorCall::Show(text.to_string()));
    }

    fn hide_alert(&mut self) {
        self.record(ActuatorCall::Hide);
    }
}
