//! The fall-alert state machine.
//!
//! Single consumer, polled once per tick with the commands drained that
//! tick. Owns `AlertState` exclusively; all timing is accumulated from
//! explicit tick deltas. Side effects are requested as `Intent`s and
//! performed elsewhere, which keeps every transition testable without a
//! scene.
//!
//! Episode shape: `Idle -> Alerting -> Recovering -> Idle`.
//! - A fall command opens an episode (or restarts the hold timer of the
//!   current one; there is never a second concurrent episode).
//! - Alerting ends after the display duration, or immediately on an
//!   explicit stand command.
//! - Recovering ends after the pose-transition duration.

use std::time::Duration;

use tracing::{debug, info};

use vigil_core::{AlertState, Command, Intent};

use crate::config::AlertConfig;

/// The alert/recovery state machine.
pub struct AlertMachine {
    state: AlertState,
    display_duration: Duration,
    fall_duration: Duration,
    message: String,
}

impl AlertMachine {
    pub fn new(cfg: &AlertConfig) -> Self {
        Self {
            state: AlertState::Idle,
            display_duration: cfg.display_duration(),
            fall_duration: cfg.fall_duration(),
            message: cfg.message.clone(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Advances the machine by one tick.
    ///
    /// Commands are applied first (in arrival order), then the timers of
    /// whatever state results, so a fall arriving this tick already
    /// accumulates this tick's delta toward its display duration.
    pub fn tick(&mut self, delta: Duration, commands: &[Command]) -> Vec<Intent> {
        let mut intents = Vec::new();

        for command in commands {
            self.apply_command(command, &mut intents);
        }
        self.advance_timers(delta, &mut intents);

        intents
    }

    fn apply_command(&mut self, command: &Command, intents: &mut Vec<Intent>) {
        match command {
            Command::Fall => match self.state {
                AlertState::Idle => {
                    info!("Fall detected, raising alert");
                    self.state = AlertState::Alerting {
                        held_for: Duration::ZERO,
                    };
                    intents.push(Intent::ShowAlert(self.message.clone()));
                    intents.push(Intent::EnterFallPose);
                }
                AlertState::Alerting { .. } => {
                    // Already down: extend the episode, don't re-pose.
                    debug!("Fall repeated while alerting, restarting hold timer");
                    self.state = AlertState::Alerting {
                        held_for: Duration::ZERO,
                    };
                    intents.push(Intent::ShowAlert(self.message.clone()));
                }
                AlertState::Recovering { .. } => {
                    info!("Fall detected during recovery, re-entering alert");
                    self.state = AlertState::Alerting {
                        held_for: Duration::ZERO,
                    };
                    intents.push(Intent::ShowAlert(self.message.clone()));
                    intents.push(Intent::EnterFallPose);
                }
            },

            Command::Stand => match self.state {
                AlertState::Alerting { .. } => {
                    info!("Stand command received, starting recovery");
                    self.enter_recovering(intents);
                }
                AlertState::Idle | AlertState::Recovering { .. } => {
                    debug!(state = %self.state, "Stand command ignored");
                }
            },

            Command::Unknown(raw) => {
                debug!(payload = %raw, "Unrecognized command ignored");
            }
        }
    }

    fn advance_timers(&mut self, delta: Duration, intents: &mut Vec<Intent>) {
        match self.state {
            AlertState::Idle => {}

            AlertState::Alerting { held_for } => {
                let held_for = held_for + delta;
                if held_for >= self.display_duration {
                    info!(
                        held_secs = held_for.as_secs_f32(),
                        "Alert display elapsed, starting recovery"
                    );
                    self.enter_recovering(intents);
                } else {
                    self.state = AlertState::Alerting { held_for };
                }
            }

            AlertState::Recovering { held_for } => {
                let held_for = held_for + delta;
                if held_for >= self.fall_duration {
                    info!("Recovery complete");
                    self.state = AlertState::Idle;
                    intents.push(Intent::HideAlert);
                } else {
                    self.state = AlertState::Recovering { held_for };
                }
            }
        }
    }

    fn enter_recovering(&mut self, intents: &mut Vec<Intent>) {
        self.state = AlertState::Recovering {
            held_for: Duration::ZERO,
        };
        intents.push(Intent::EnterStandPose);
    }
}
