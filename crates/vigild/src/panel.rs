//! The warning-panel animation driver.
//!
//! Single-threaded cooperative animation: the driver calls `tick(delta)`
//! once per consumer tick and reads `scale()` for the host renderer.
//! Four phases cycle `Hidden -> Showing -> Visible -> Hiding -> Hidden`.
//! The grow/shrink curves are a monotone smoothstep over [0, 1], scaled
//! by the configured animation speed; `Visible` holds for the display
//! duration before auto-hiding.

use std::time::Duration;

use tracing::debug;

use vigil_core::{AnimationPhase, AnimationState, Intent};

use crate::config::AlertConfig;

/// The show/hide panel animator.
pub struct PanelAnimator {
    phase: AnimationPhase,
    /// Curve progress in [0, 1] while Showing/Hiding.
    elapsed: f32,
    /// Hold time accumulated while Visible.
    held: Duration,
    display_duration: Duration,
    animation_speed: f32,
}

impl PanelAnimator {
    pub fn new(cfg: &AlertConfig) -> Self {
        Self {
            phase: AnimationPhase::Hidden,
            elapsed: 0.0,
            held: Duration::ZERO,
            display_duration: cfg.display_duration(),
            animation_speed: cfg.animation_speed,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// Snapshot for status displays.
    pub fn state(&self) -> AnimationState {
        AnimationState {
            phase: self.phase,
            elapsed: match self.phase {
                AnimationPhase::Hidden => 0.0,
                AnimationPhase::Visible => 1.0,
                AnimationPhase::Showing | AnimationPhase::Hiding => self.elapsed,
            },
        }
    }

    /// Panel scale in [0, 1] for the host renderer.
    pub fn scale(&self) -> f32 {
        match self.phase {
            AnimationPhase::Hidden => 0.0,
            AnimationPhase::Showing => smoothstep(self.elapsed),
            AnimationPhase::Visible => 1.0,
            AnimationPhase::Hiding => smoothstep(1.0 - self.elapsed),
        }
    }

    /// Applies an intent from the alert state machine.
    ///
    /// Pose intents are not panel concerns and are ignored here.
    pub fn apply(&mut self, intent: &Intent) {
        match intent {
            Intent::ShowAlert(_) => self.show(),
            Intent::HideAlert => self.hide(),
            Intent::EnterFallPose | Intent::EnterStandPose => {}
        }
    }

    fn show(&mut self) {
        match self.phase {
            AnimationPhase::Hidden => {
                debug!("Panel show starting");
                self.phase = AnimationPhase::Showing;
                self.elapsed = 0.0;
            }
            AnimationPhase::Showing => {
                // Grow animation keeps running; nothing to restart.
            }
            AnimationPhase::Visible => {
                // Cancel the pending hide by restarting the hold only.
                debug!("Panel hold restarted");
                self.held = Duration::ZERO;
            }
            AnimationPhase::Hiding => {
                // Resume growing from the current scale, no visual jump.
                debug!("Panel re-shown mid-hide");
                self.phase = AnimationPhase::Showing;
                self.elapsed = 1.0 - self.elapsed;
            }
        }
    }

    fn hide(&mut self) {
        match self.phase {
            AnimationPhase::Visible => {
                debug!("Panel hide starting");
                self.phase = AnimationPhase::Hiding;
                self.elapsed = 0.0;
            }
            AnimationPhase::Showing => {
                debug!("Panel hidden mid-show");
                self.phase = AnimationPhase::Hiding;
                self.elapsed = 1.0 - self.elapsed;
            }
            AnimationPhase::Hidden | AnimationPhase::Hiding => {}
        }
    }

    /// Advances the animation by one tick.
    pub fn tick(&mut self, delta: Duration) {
        match self.phase {
            AnimationPhase::Hidden => {}

            AnimationPhase::Showing => {
                self.elapsed += delta.as_secs_f32() * self.animation_speed;
                if self.elapsed >= 1.0 {
                    self.phase = AnimationPhase::Visible;
                    self.elapsed = 1.0;
                    self.held = Duration::ZERO;
                }
            }

            AnimationPhase::Visible => {
                self.held += delta;
                if self.held >= self.display_duration {
                    debug!("Panel hold elapsed, hiding");
                    self.phase = AnimationPhase::Hiding;
                    self.elapsed = 0.0;
                }
            }

            AnimationPhase::Hiding => {
                self.elapsed += delta.as_secs_f32() * self.animation_speed;
                if self.elapsed >= 1.0 {
                    self.phase = AnimationPhase::Hidden;
                    self.elapsed = 0.0;
                }
            }
        }
    }
}

/// Monotone ease-in-out over [0, 1].
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::AnimationPhase::*;

    // 20Hz test tick: with speed 2.0 each tick advances the curve by
    // exactly 0.1, so grow/shrink complete in a deterministic 10 ticks.
    const TICK: Duration = Duration::from_millis(50);

    fn animator() -> PanelAnimator {
        PanelAnimator::new(&AlertConfig::default())
    }

    fn show(p: &mut PanelAnimator) {
        p.apply(&Intent::ShowAlert("warn".to_string()));
    }

    fn run_until(p: &mut PanelAnimator, phase: AnimationPhase, max_ticks: usize) -> usize {
        for n in 0..max_ticks {
            if p.phase() == phase {
                return n;
            }
            p.tick(TICK);
        }
        max_ticks
    }

    #[test]
    fn test_starts_hidden() {
        let p = animator();
        assert_eq!(p.phase(), Hidden);
        assert_eq!(p.scale(), 0.0);
    }

    #[test]
    fn test_tick_while_hidden_is_inert() {
        let mut p = animator();
        for _ in 0..100 {
            p.tick(TICK);
        }
        assert_eq!(p.phase(), Hidden);
    }

    #[test]
    fn test_show_grows_to_visible() {
        let mut p = animator();
        show(&mut p);
        assert_eq!(p.phase(), Showing);

        let ticks = run_until(&mut p, Visible, 100);
        assert_eq!(ticks, 10);
        assert_eq!(p.scale(), 1.0);
    }

    #[test]
    fn test_scale_monotone_while_showing() {
        let mut p = animator();
        show(&mut p);

        let mut last = p.scale();
        while p.phase() == Showing {
            p.tick(TICK);
            let scale = p.scale();
            assert!(scale >= last, "scale regressed: {scale} < {last}");
            last = scale;
        }
    }

    #[test]
    fn test_full_cycle_returns_to_hidden() {
        let mut p = animator();
        show(&mut p);

        run_until(&mut p, Visible, 100);
        // Hold: 5s => 100 ticks at 20Hz, then hide: 10 ticks.
        let hold_ticks = run_until(&mut p, Hiding, 400);
        assert_eq!(hold_ticks, 100);
        let hide_ticks = run_until(&mut p, Hidden, 100);
        assert_eq!(hide_ticks, 10);
        assert_eq!(p.scale(), 0.0);
    }

    #[test]
    fn test_reshow_while_visible_restarts_hold_only() {
        let mut p = animator();
        show(&mut p);
        run_until(&mut p, Visible, 100);

        // Half the hold, then a new alert.
        for _ in 0..50 {
            p.tick(TICK);
        }
        assert_eq!(p.phase(), Visible);
        show(&mut p);

        // No re-grow, and the hold runs its full length again.
        assert_eq!(p.phase(), Visible);
        assert_eq!(p.scale(), 1.0);
        let hold_ticks = run_until(&mut p, Hiding, 400);
        assert_eq!(hold_ticks, 100);
    }

    #[test]
    fn test_reshow_while_showing_does_not_restart_grow() {
        let mut p = animator();
        show(&mut p);
        for _ in 0..5 {
            p.tick(TICK);
        }
        let mid = p.scale();
        assert!(mid > 0.0 && mid < 1.0);

        show(&mut p);
        assert_eq!(p.phase(), Showing);
        assert_eq!(p.scale(), mid);
    }

    #[test]
    fn test_reshow_while_hiding_resumes_from_current_scale() {
        let mut p = animator();
        show(&mut p);
        run_until(&mut p, Visible, 100);
        p.apply(&Intent::HideAlert);
        assert_eq!(p.phase(), Hiding);

        for _ in 0..4 {
            p.tick(TICK);
        }
        let mid = p.scale();

        show(&mut p);
        assert_eq!(p.phase(), Showing);
        let resumed = p.scale();
        assert!((resumed - mid).abs() < 1e-5, "scale jumped: {mid} -> {resumed}");
    }

    #[test]
    fn test_hide_from_visible() {
        let mut p = animator();
        show(&mut p);
        run_until(&mut p, Visible, 100);

        p.apply(&Intent::HideAlert);
        assert_eq!(p.phase(), Hiding);
        let ticks = run_until(&mut p, Hidden, 100);
        assert_eq!(ticks, 10);
    }

    #[test]
    fn test_hide_while_hidden_is_inert() {
        let mut p = animator();
        p.apply(&Intent::HideAlert);
        assert_eq!(p.phase(), Hidden);
    }

    #[test]
    fn test_pose_intents_ignored() {
        let mut p = animator();
        p.apply(&Intent::EnterFallPose);
        p.apply(&Intent::EnterStandPose);
        assert_eq!(p.phase(), Hidden);
    }

    #[test]
    fn test_state_snapshot_tracks_phase_and_progress() {
        let mut p = animator();
        assert_eq!(p.state().phase, Hidden);
        assert_eq!(p.state().elapsed, 0.0);

        show(&mut p);
        for _ in 0..5 {
            p.tick(TICK);
        }
        let state = p.state();
        assert_eq!(state.phase, Showing);
        assert!(state.elapsed > 0.0 && state.elapsed < 1.0);

        run_until(&mut p, Visible, 100);
        assert_eq!(p.state().elapsed, 1.0);
    }

    #[test]
    fn test_smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        // Clamped outside the domain.
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
    }
}
