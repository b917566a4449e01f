//! Pooled transient light effects: glowing streaks near the tree and
//! shooting stars in the far sky.
//!
//! Both follow the same pattern: a fixed pool of slots, each either
//! inactive (rendered as a zero-scale transform so the draw-call shape
//! never changes) or active with a monotone progress in [0, 1]. Streaks
//! activate in periodic batches; meteors are individually rescheduled.

use glam::{Mat4, Quat, Vec3};
use rand::prelude::*;

pub const STREAK_POOL: usize = 10;
pub const STREAK_INTERVAL: f32 = 10.0; // seconds between batches
const STREAK_TRAVEL: f32 = 8.0; // total dash distance at progress 1
const STREAK_GLOW: f32 = 0.1875;
const STREAK_COLOR_START: [f32; 3] = [1.0, 0.937, 0.784]; // #FFEFC8
const STREAK_COLOR_END: [f32; 3] = [1.0, 0.82, 0.878]; // #FFD1E0

pub const METEOR_POOL: usize = 8;
const METEOR_COLOR: [f32; 3] = [1.0, 0.937, 0.835]; // #FFEFD5
const METEOR_WIDTH: f32 = 0.015;

#[derive(Clone, Copy, Debug, Default)]
pub struct StreakSlot {
    pub active: bool,
    pub progress: f32,
    pub start: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub length: f32,
    pub width: f32,
    pub color: Vec3,
}

impl StreakSlot {
    /// Instance transform for this frame; zero-scale when inactive.
    pub fn transform(&self) -> Mat4 {
        if !self.active {
            return Mat4::from_scale(Vec3::ZERO);
        }
        let position = self.start + self.direction * (self.progress * STREAK_TRAVEL);
        let rotation = Quat::from_rotation_arc(Vec3::Z, self.direction);
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.width, self.width, self.length),
            rotation,
            position,
        )
    }

    /// Transform composed under the rotating scene group. Streaks live
    /// inside the group, so the group matrix premultiplies; inactive
    /// slots stay at the origin with zero scale.
    pub fn transform_in(&self, group: Mat4) -> Mat4 {
        if !self.active {
            return Mat4::from_scale(Vec3::ZERO);
        }
        group * self.transform()
    }

    /// Color with the smooth sine fade applied.
    pub fn shaded_color(&self) -> Vec3 {
        if !self.active {
            return Vec3::ZERO;
        }
        let opacity = (self.progress * std::f32::consts::PI).sin();
        self.color * (opacity * STREAK_GLOW)
    }
}

pub struct StreakPool {
    slots: [StreakSlot; STREAK_POOL],
    last_trigger: f32,
}

impl Default for StreakPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakPool {
    pub fn new() -> Self {
        Self {
            slots: [StreakSlot::default(); STREAK_POOL],
            last_trigger: 0.0,
        }
    }

    pub fn slots(&self) -> &[StreakSlot] {
        &self.slots
    }

    /// Advance one frame. Every [`STREAK_INTERVAL`] seconds a random
    /// batch of 5–10 slots re-activates simultaneously.
    pub fn step(&mut self, time: f32, rng: &mut impl Rng) {
        if time - self.last_trigger > STREAK_INTERVAL {
            self.spawn_batch(rng);
            self.last_trigger = time;
        }
        for slot in &mut self.slots {
            if !slot.active {
                continue;
            }
            slot.progress += 0.015 * slot.speed;
            if slot.progress >= 1.0 {
                slot.active = false;
            }
        }
    }

    fn spawn_batch(&mut self, rng: &mut impl Rng) {
        let count = rng.gen_range(5..=STREAK_POOL);
        for slot in self.slots.iter_mut().take(count) {
            let radius = rng.gen::<f32>() * 6.0;
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            // Height band offset to center the batch around the tree.
            let h = (rng.gen::<f32>() - 0.5) * 4.0 + 1.5;
            slot.active = true;
            slot.progress = 0.0;
            slot.start = Vec3::new(angle.cos() * radius, h, angle.sin() * radius);
            slot.direction = Vec3::new(
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
            )
            .normalize_or_zero();
            if slot.direction == Vec3::ZERO {
                slot.direction = Vec3::Z;
            }
            slot.speed = 0.4 + rng.gen::<f32>() * 0.4;
            slot.length = 0.8 + rng.gen::<f32>() * 0.8;
            slot.width = 0.0025 + rng.gen::<f32>() * 0.0035;
            let mix = rng.gen::<f32>();
            slot.color = Vec3::from(STREAK_COLOR_START).lerp(Vec3::from(STREAK_COLOR_END), mix);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MeteorSlot {
    pub active: bool,
    pub progress: f32,
    pub start: Vec3,
    pub end: Vec3,
    /// Progress increment per frame, normalized by trajectory length.
    pub speed: f32,
    pub length: f32,
    pub next_spawn: f32,
}

impl MeteorSlot {
    /// Fade-in over the first 20% of progress, fade-out over the last.
    pub fn opacity(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        if self.progress < 0.2 {
            self.progress * 5.0
        } else if self.progress > 0.8 {
            1.0 - (self.progress - 0.8) * 5.0
        } else {
            1.0
        }
    }

    pub fn transform(&self) -> Mat4 {
        if !self.active {
            return Mat4::from_scale(Vec3::ZERO);
        }
        let position = self.start.lerp(self.end, self.progress);
        let direction = (self.end - self.start).normalize_or_zero();
        let rotation = Quat::from_rotation_arc(Vec3::Z, direction);
        Mat4::from_scale_rotation_translation(
            Vec3::new(METEOR_WIDTH, METEOR_WIDTH, self.length),
            rotation,
            position,
        )
    }

    /// Color modulated by the fade envelope and the shared 1 Hz
    /// brightness pulse.
    pub fn shaded_color(&self, time: f32) -> Vec3 {
        let pulse = 1.0 + 0.3 * (time * std::f32::consts::TAU).sin();
        Vec3::from(METEOR_COLOR) * (self.opacity() * pulse)
    }
}

pub struct MeteorPool {
    slots: [MeteorSlot; METEOR_POOL],
}

impl MeteorPool {
    /// Initial spawns are staggered over a five second window.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut slots = [MeteorSlot::default(); METEOR_POOL];
        for slot in &mut slots {
            slot.next_spawn = rng.gen::<f32>() * 5.0;
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[MeteorSlot] {
        &self.slots
    }

    pub fn step(&mut self, time: f32, rng: &mut impl Rng) {
        for slot in &mut self.slots {
            if !slot.active {
                // An unreached schedule just stays hidden; no backlog.
                if time >= slot.next_spawn {
                    Self::launch(slot, time, rng);
                } else {
                    continue;
                }
            }
            slot.progress += slot.speed;
            if slot.progress >= 1.0 {
                slot.active = false;
            }
        }
    }

    fn launch(slot: &mut MeteorSlot, time: f32, rng: &mut impl Rng) {
        // Start on a distant shell, biased to the upper hemisphere.
        let radius = 50.0 + rng.gen::<f32>() * 20.0;
        let theta = rng.gen::<f32>() * std::f32::consts::TAU;
        let phi = rng.gen::<f32>() * std::f32::consts::FRAC_PI_2;
        slot.start = Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        );

        // Mostly downward-forward across the view.
        let direction = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 1.6,
            (rng.gen::<f32>() - 0.5) * 0.6,
            -1.1 + (rng.gen::<f32>() - 0.5) * 0.2,
        )
        .normalize();
        let distance = 30.0 + rng.gen::<f32>() * 20.0;
        slot.end = slot.start + direction * distance;

        // Normalize per-frame speed so traversal covers progress 0..1
        // over a duration implied by distance.
        let speed_units = 1.2 + rng.gen::<f32>() * 1.3;
        slot.speed = speed_units / distance;

        slot.length = 0.6 + rng.gen::<f32>() * 0.6;
        slot.progress = 0.0;
        slot.active = true;
        slot.next_spawn = time + 3.5 + rng.gen::<f32>() * 5.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn streak_batches_fire_on_the_interval() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = StreakPool::new();
        pool.step(5.0, &mut rng);
        assert!(pool.slots().iter().all(|s| !s.active), "nothing before the interval");
        pool.step(STREAK_INTERVAL + 0.1, &mut rng);
        let live = pool.slots().iter().filter(|s| s.active).count();
        assert!((5..=STREAK_POOL).contains(&live), "batch of 5-10, got {live}");
    }

    #[test]
    fn streak_progress_is_monotone_and_slot_retires_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = StreakPool::new();
        let mut time = STREAK_INTERVAL + 0.1;
        pool.step(time, &mut rng);
        let idx = pool.slots().iter().position(|s| s.active).unwrap();
        let mut prev = pool.slots()[idx].progress;
        let mut deactivations = 0;
        for _ in 0..500 {
            time += 1.0 / 60.0;
            let was_active = pool.slots()[idx].active;
            pool.step(time, &mut rng);
            let slot = pool.slots()[idx];
            if slot.active {
                assert!(slot.progress >= prev, "progress never decreases mid-flight");
                prev = slot.progress;
            } else if was_active {
                deactivations += 1;
                break;
            }
        }
        assert_eq!(deactivations, 1);
    }

    #[test]
    fn inactive_slots_render_degenerate() {
        let slot = StreakSlot::default();
        assert_eq!(slot.transform(), Mat4::from_scale(Vec3::ZERO));
        assert_eq!(slot.shaded_color(), Vec3::ZERO);
        let meteor = MeteorSlot::default();
        assert_eq!(meteor.transform(), Mat4::from_scale(Vec3::ZERO));
        assert_eq!(meteor.opacity(), 0.0);
    }

    #[test]
    fn streaks_ride_the_rotating_group() {
        let slot = StreakSlot {
            active: true,
            progress: 0.0,
            start: Vec3::new(2.0, 1.0, 0.0),
            direction: Vec3::Z,
            speed: 0.5,
            length: 1.0,
            width: 0.004,
            color: Vec3::ONE,
        };
        let group = Mat4::from_translation(Vec3::new(0.0, -1.5, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let world = slot.transform_in(group).transform_point3(Vec3::ZERO);
        // A quarter turn maps +x to -z, then the group offset applies.
        assert!((world - Vec3::new(0.0, -0.5, -2.0)).length() < 1e-5);

        // Inactive slots ignore the group entirely.
        let idle = StreakSlot::default();
        assert_eq!(idle.transform_in(group), Mat4::from_scale(Vec3::ZERO));
    }

    #[test]
    fn meteors_wait_for_their_schedule() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = MeteorPool::new(&mut rng);
        let earliest = pool
            .slots()
            .iter()
            .map(|s| s.next_spawn)
            .fold(f32::INFINITY, f32::min);
        if earliest > 0.0 {
            pool.step(earliest - 0.01, &mut rng);
            // Slots whose schedule has not arrived stay hidden.
            for s in pool.slots() {
                if s.next_spawn > earliest - 0.01 {
                    assert!(!s.active);
                }
            }
        }
        pool.step(5.0, &mut rng);
        assert!(pool.slots().iter().any(|s| s.active), "stagger window elapsed");
    }

    #[test]
    fn meteor_fade_envelope_shape() {
        let mut slot = MeteorSlot {
            active: true,
            ..Default::default()
        };
        slot.progress = 0.1;
        assert!((slot.opacity() - 0.5).abs() < 1e-5);
        slot.progress = 0.5;
        assert_eq!(slot.opacity(), 1.0);
        slot.progress = 0.9;
        assert!((slot.opacity() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn meteor_completes_and_reschedules_later() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = MeteorPool::new(&mut rng);
        let mut time = 6.0;
        pool.step(time, &mut rng);
        let idx = pool.slots().iter().position(|s| s.active).unwrap();
        let reschedule = pool.slots()[idx].next_spawn;
        assert!(reschedule >= time + 3.5 && reschedule <= time + 9.0);
        // Drive the slot to completion without letting its schedule
        // re-arrive (time held fixed below next_spawn).
        for _ in 0..100_000 {
            pool.step(time, &mut rng);
            time += 1.0 / 60.0;
            if time >= reschedule - 0.1 {
                break;
            }
            if !pool.slots()[idx].active {
                break;
            }
        }
        assert!(!pool.slots()[idx].active, "slot retired after progress crossed 1");
    }
}
