//! Hand-landmark interpretation.
//!
//! The tracker consumes one optional 21-point landmark sample per
//! detector frame and produces a discrete gesture plus an optional
//! rotation delta derived from horizontal wrist motion. It keeps one
//! sample of history (the previous wrist x) and nothing else.

use crate::constants::{FIST_DISTANCE, OPEN_DISTANCE, ROTATION_DEADZONE, ROTATION_SENSITIVITY};
use glam::Vec3;

pub const LANDMARK_COUNT: usize = 21;

// MediaPipe hand landmark indices consumed here.
pub const WRIST: usize = 0;
pub const FINGERTIPS: [usize; 4] = [8, 12, 16, 20]; // index, middle, ring, pinky

/// One hand sample: 21 landmarks in normalized detector space.
pub type HandLandmarks = [Vec3; LANDMARK_COUNT];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Open,
    Fist,
}

/// Per-sample tracker output.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureSample {
    pub gesture: GestureState,
    /// Rotation to add to the accumulated target angle, radians.
    /// `None` when the wrist moved less than the deadzone or there was
    /// no previous sample to difference against.
    pub rotation_delta: Option<f32>,
}

/// Classify a hand by the average wrist-to-fingertip distance.
///
/// Both bounds are exclusive; the band between them maps to `Idle` so
/// a hand hovering near a threshold does not flicker between states.
#[inline]
pub fn classify(avg_tip_distance: f32) -> GestureState {
    if avg_tip_distance > OPEN_DISTANCE {
        GestureState::Open
    } else if avg_tip_distance < FIST_DISTANCE {
        GestureState::Fist
    } else {
        GestureState::Idle
    }
}

#[inline]
pub fn average_tip_distance(landmarks: &HandLandmarks) -> f32 {
    let wrist = landmarks[WRIST];
    let total: f32 = FINGERTIPS
        .iter()
        .map(|&tip| landmarks[tip].distance(wrist))
        .sum();
    total / FINGERTIPS.len() as f32
}

#[derive(Debug, Default)]
pub struct GestureTracker {
    prev_wrist_x: Option<f32>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one detector result. `None` means no hand was seen
    /// this frame; that resets the wrist history so the next detected
    /// frame cannot difference against a stale sample.
    pub fn update(&mut self, landmarks: Option<&HandLandmarks>) -> GestureSample {
        let Some(landmarks) = landmarks else {
            self.prev_wrist_x = None;
            return GestureSample::default();
        };

        let wrist_x = landmarks[WRIST].x;
        let rotation_delta = self.prev_wrist_x.and_then(|prev| {
            let dx = wrist_x - prev;
            (dx.abs() > ROTATION_DEADZONE).then_some(dx * ROTATION_SENSITIVITY)
        });
        // Stored even when the delta was suppressed.
        self.prev_wrist_x = Some(wrist_x);

        GestureSample {
            gesture: classify(average_tip_distance(landmarks)),
            rotation_delta,
        }
    }

    /// Drop all history, e.g. when tracking is toggled off.
    pub fn reset(&mut self) {
        self.prev_wrist_x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand(wrist_x: f32, tip_distance: f32) -> HandLandmarks {
        let mut lm = [Vec3::ZERO; LANDMARK_COUNT];
        lm[WRIST] = Vec3::new(wrist_x, 0.5, 0.0);
        for &tip in &FINGERTIPS {
            lm[tip] = Vec3::new(wrist_x, 0.5 + tip_distance, 0.0);
        }
        lm
    }

    #[test]
    fn classification_thresholds_are_exclusive() {
        assert_eq!(classify(0.10), GestureState::Fist);
        assert_eq!(classify(0.27), GestureState::Idle);
        assert_eq!(classify(0.40), GestureState::Open);
        // Boundary values land in the neutral band.
        assert_eq!(classify(OPEN_DISTANCE), GestureState::Idle);
        assert_eq!(classify(FIST_DISTANCE), GestureState::Idle);
    }

    #[test]
    fn rotation_delta_scales_and_respects_deadzone() {
        let mut tracker = GestureTracker::new();
        assert!(tracker.update(Some(&flat_hand(0.5, 0.27))).rotation_delta.is_none());

        // Below the deadzone: suppressed, but wrist history still advances.
        let s = tracker.update(Some(&flat_hand(0.501, 0.27)));
        assert!(s.rotation_delta.is_none());

        let s = tracker.update(Some(&flat_hand(0.511, 0.27)));
        let delta = s.rotation_delta.expect("delta above deadzone");
        assert!((delta - 0.01 * ROTATION_SENSITIVITY).abs() < 1e-4);
    }

    #[test]
    fn dropped_hand_resets_wrist_history() {
        let mut tracker = GestureTracker::new();
        tracker.update(Some(&flat_hand(0.2, 0.27)));
        let s = tracker.update(None);
        assert_eq!(s.gesture, GestureState::Idle);
        // First frame after reappearance must not difference against 0.2.
        let s = tracker.update(Some(&flat_hand(0.8, 0.27)));
        assert!(s.rotation_delta.is_none());
    }
}
