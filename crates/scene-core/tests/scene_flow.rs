// End-to-end checks of the gesture pipeline: raw landmarks through the
// tracker into the eased interaction state, over simulated frames.

use glam::Vec3;
use scene_core::{
    parse_wish_or_fallback, GestureState, GestureTracker, HandLandmarks, InteractionState, Wish,
    FINGERTIPS, LANDMARK_COUNT, WRIST,
};

const DT: f32 = 1.0 / 60.0;

/// Hand with all four tracked fingertips at `spread` from the wrist.
fn hand(spread: f32, wrist_x: f32) -> HandLandmarks {
    let mut lm = [Vec3::new(wrist_x, 0.5, 0.0); LANDMARK_COUNT];
    lm[WRIST] = Vec3::new(wrist_x, 0.5, 0.0);
    for &tip in &FINGERTIPS {
        lm[tip] = Vec3::new(wrist_x + spread, 0.5, 0.0);
    }
    lm
}

#[test]
fn open_hand_disperses_and_fist_reforms() {
    let mut tracker = GestureTracker::new();
    let mut state = InteractionState::new();

    let open = hand(0.5, 0.5);
    for _ in 0..180 {
        let sample = tracker.update(Some(&open));
        assert_eq!(sample.gesture, GestureState::Open);
        state.step(sample.gesture, DT);
    }
    assert!(state.scatter > 0.9, "three seconds open nearly saturates");

    let fist = hand(0.1, 0.5);
    for _ in 0..300 {
        let sample = tracker.update(Some(&fist));
        assert_eq!(sample.gesture, GestureState::Fist);
        state.step(sample.gesture, DT);
    }
    assert!(state.scatter < 0.05, "fist pulls the tree back together");
}

#[test]
fn losing_the_hand_freezes_the_scene_factor() {
    let mut tracker = GestureTracker::new();
    let mut state = InteractionState::new();

    let open = hand(0.5, 0.5);
    for _ in 0..60 {
        state.step(tracker.update(Some(&open)).gesture, DT);
    }
    let held = state.scatter;

    for _ in 0..240 {
        let sample = tracker.update(None);
        assert_eq!(sample.gesture, GestureState::Idle);
        assert_eq!(sample.rotation_delta, None);
        state.step(sample.gesture, DT);
    }
    assert_eq!(state.scatter, held);
}

#[test]
fn hand_sweep_steers_rotation_and_kills_auto_spin() {
    let mut tracker = GestureTracker::new();
    let mut state = InteractionState::new();

    // Establish wrist history, then sweep right in large steps.
    tracker.update(Some(&hand(0.3, 0.2)));
    let mut applied = 0.0;
    for i in 1..=10 {
        let x = 0.2 + i as f32 * 0.02;
        let sample = tracker.update(Some(&hand(0.3, x)));
        if let Some(delta) = sample.rotation_delta {
            state.apply_rotation_delta(delta);
            applied += delta;
        }
        state.step(sample.gesture, DT);
    }
    assert!(applied > 1.0, "sweep of 0.2 scaled by sensitivity");

    // Once the hand has steered, idling no longer auto-spins.
    let target = state.rotation_target;
    for _ in 0..120 {
        state.step(tracker.update(None).gesture, DT);
    }
    assert_eq!(state.rotation_target, target);
    assert!(
        (state.rotation_target - state.rotation).abs() < 1e-3,
        "display angle converged onto the target"
    );
}

#[test]
fn jitter_below_the_deadzone_never_moves_the_tree() {
    let mut tracker = GestureTracker::new();
    let mut state = InteractionState::new();

    tracker.update(Some(&hand(0.3, 0.5)));
    for i in 0..120 {
        // +-0.001 of wrist noise, under the deadzone.
        let x = 0.5 + if i % 2 == 0 { 0.001 } else { -0.001 };
        let sample = tracker.update(Some(&hand(0.3, x)));
        assert_eq!(sample.rotation_delta, None);
        state.step(sample.gesture, DT);
    }
}

#[test]
fn unparseable_wish_payload_degrades_to_the_fallback() {
    let wish = parse_wish_or_fallback("{\"greeting\": \"hi\"}");
    assert_eq!(wish, Wish::fallback());
    let wish = parse_wish_or_fallback("not json at all");
    assert_eq!(wish, Wish::fallback());
}
