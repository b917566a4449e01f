//! Eased interaction state bridging discrete gestures to continuous
//! animation parameters.

use crate::constants::{AUTO_SPIN_SPEED, ROTATION_EASE, SCATTER_EASE_RATE};
use crate::gesture::GestureState;

/// Per-frame smoothed scene parameters.
///
/// The scatter factor and displayed rotation are both eased so that a
/// noisy or abruptly changing gesture stream never produces a visual
/// snap. `scatter` drives the tree's blend between its rest layout and
/// the dispersed layout; `rotation` is the angle actually applied to
/// the scene group, trailing `rotation_target`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractionState {
    pub scatter: f32,
    pub rotation: f32,
    pub rotation_target: f32,
    /// Set once the hand has steered rotation; suppresses auto-spin.
    hand_rotated: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a hand-motion rotation delta (radians).
    pub fn apply_rotation_delta(&mut self, delta: f32) {
        self.rotation_target += delta;
        self.hand_rotated = true;
    }

    /// Advance the eased values by one frame.
    ///
    /// The scatter factor moves toward 1 while the hand is open and
    /// toward 0 while it is a fist, by exponential smoothing
    /// (`value += (target - value) * rate * dt`). An idle gesture holds
    /// the factor where it is rather than steering it either way.
    pub fn step(&mut self, gesture: GestureState, dt_sec: f32) {
        let target = match gesture {
            GestureState::Open => Some(1.0),
            GestureState::Fist => Some(0.0),
            GestureState::Idle => None,
        };
        if let Some(target) = target {
            let rate = (SCATTER_EASE_RATE * dt_sec).min(1.0);
            self.scatter += (target - self.scatter) * rate;
        }
        self.scatter = self.scatter.clamp(0.0, 1.0);

        // Gentle automatic spin until the hand takes over.
        if !self.hand_rotated && gesture == GestureState::Idle {
            self.rotation_target += AUTO_SPIN_SPEED * dt_sec;
        }
        self.rotation += (self.rotation_target - self.rotation) * ROTATION_EASE;
    }

    /// Back to defaults, e.g. when tracking is toggled off.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn open_hand_rises_toward_one_without_overshoot() {
        let mut state = InteractionState::new();
        let mut prev = 0.0;
        for _ in 0..600 {
            state.step(GestureState::Open, DT);
            // Strict growth only until f32 saturates near the target.
            if prev < 1.0 - 1e-4 {
                assert!(state.scatter > prev, "strictly increasing below saturation");
            } else {
                assert!(state.scatter >= prev, "never regresses");
            }
            assert!(state.scatter <= 1.0, "never overshoots");
            prev = state.scatter;
        }
        assert!(state.scatter > 0.99);
    }

    #[test]
    fn idle_holds_and_fist_decays() {
        let mut state = InteractionState::new();
        for _ in 0..60 {
            state.step(GestureState::Open, DT);
        }
        let held = state.scatter;
        for _ in 0..120 {
            state.step(GestureState::Idle, DT);
        }
        assert_eq!(state.scatter, held, "idle freezes the factor");

        let mut prev = state.scatter;
        for _ in 0..600 {
            state.step(GestureState::Fist, DT);
            assert!(state.scatter < prev, "strictly decreasing");
            assert!(state.scatter >= 0.0);
            prev = state.scatter;
        }
        assert!(state.scatter < 0.01);
    }

    #[test]
    fn rotation_eases_toward_target() {
        let mut state = InteractionState::new();
        state.apply_rotation_delta(1.0);
        let mut prev_gap = (state.rotation_target - state.rotation).abs();
        for _ in 0..60 {
            state.step(GestureState::Idle, DT);
            let gap = (state.rotation_target - state.rotation).abs();
            assert!(gap < prev_gap, "gap shrinks every frame");
            prev_gap = gap;
        }
        // Hand rotation suppresses the automatic spin.
        assert!((state.rotation_target - 1.0).abs() < 1e-6);
    }

    #[test]
    fn auto_spin_advances_until_hand_takes_over() {
        let mut state = InteractionState::new();
        for _ in 0..60 {
            state.step(GestureState::Idle, DT);
        }
        assert!(state.rotation_target > 0.0);
        let before = state.rotation_target;
        state.apply_rotation_delta(0.5);
        state.step(GestureState::Idle, DT);
        assert!((state.rotation_target - (before + 0.5)).abs() < 1e-6);
    }
}
