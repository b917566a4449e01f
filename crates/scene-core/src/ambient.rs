//! Decorative elements around the tree: the rising spiral band, the
//! hanging light strands, the drifting dust field, the constellation
//! and the star topper.
//!
//! Spiral and strand motion live entirely in their vertex shaders; the
//! generators here only lay down static attribute buffers. Dust and the
//! topper are stepped on the CPU each frame.

use crate::constants::*;
use crate::gesture::GestureState;
use glam::Vec3;
use rand::prelude::*;

// Spiral band
pub const SPIRAL_COUNT: usize = 1800;
pub const SPIRAL_HEIGHT: f32 = 4.6; // tree height + 0.6
pub const SPIRAL_BASE_RADIUS: f32 = 1.6;
pub const SPIRAL_TURNS: f32 = 4.2;
pub const SPIRAL_ROTATION_SPEED: f32 = 0.12;
pub const SPIRAL_RISE_SPEED: f32 = 0.05;
pub const SPIRAL_LINE_WIDTH: f32 = 0.025;

// Hanging strands, clustered into three angular groups
pub const STRAND_ANGLES: [f32; 5] = [0.0, 0.1, 2.094, 2.194, 4.188];
pub const STRAND_POINTS: usize = 400;
pub const STRAND_HEIGHT: f32 = 4.0;
pub const STRAND_BASE_RADIUS: f32 = 1.4; // slightly wider than the tree

/// Attributes for one shader-animated point ribbon (spiral band).
#[derive(Clone, Debug)]
pub struct SpiralGeometry {
    pub progress: Vec<f32>,
    pub seeds: Vec<f32>,
    pub sizes: Vec<f32>,
    pub offsets: Vec<Vec3>,
}

impl SpiralGeometry {
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    pub fn generate(count: usize, rng: &mut impl Rng) -> Self {
        let mut progress = Vec::with_capacity(count);
        let mut seeds = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            progress.push(rng.gen());
            seeds.push(rng.gen());
            sizes.push(0.015 + rng.gen::<f32>() * 0.01);
            offsets.push(Vec3::new(
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
            ));
        }
        Self {
            progress,
            seeds,
            sizes,
            offsets,
        }
    }
}

/// Attributes for the five hanging light strands. Progress runs from 0
/// at the peak to 1 at the floor; the strand angle is baked per point
/// so the shader needs no uniform array.
#[derive(Clone, Debug)]
pub struct StrandGeometry {
    pub progress: Vec<f32>,
    pub angles: Vec<f32>,
    pub strand_index: Vec<f32>,
    pub seeds: Vec<f32>,
}

impl StrandGeometry {
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    pub fn generate(rng: &mut impl Rng) -> Self {
        let total = STRAND_ANGLES.len() * STRAND_POINTS;
        let mut progress = Vec::with_capacity(total);
        let mut angles = Vec::with_capacity(total);
        let mut strand_index = Vec::with_capacity(total);
        let mut seeds = Vec::with_capacity(total);
        for (line, &angle) in STRAND_ANGLES.iter().enumerate() {
            for p in 0..STRAND_POINTS {
                progress.push(p as f32 / STRAND_POINTS as f32);
                angles.push(angle);
                strand_index.push(line as f32);
                seeds.push(rng.gen());
            }
        }
        Self {
            progress,
            angles,
            strand_index,
            seeds,
        }
    }
}

/// CPU-integrated dust cloud inside a spherical bound.
#[derive(Clone, Debug)]
pub struct DustField {
    pub positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    radius: f32,
}

impl DustField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Uniform distribution over a ball of `radius`.
    pub fn generate(count: usize, radius: f32, rng: &mut impl Rng) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        for _ in 0..count {
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let r = radius * rng.gen::<f32>().cbrt();
            positions.push(Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            ));
            velocities.push(Vec3::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * DUST_VELOCITY,
                (rng.gen::<f32>() - 0.5) * 2.0 * DUST_VELOCITY,
                (rng.gen::<f32>() - 0.5) * 2.0 * DUST_VELOCITY,
            ));
        }
        Self {
            positions,
            velocities,
            radius,
        }
    }

    /// Advance the drift. Velocities are expressed per 60 Hz reference
    /// frame; a stalled clock produces one oversized step and no
    /// further correction. An open hand scales the drift up.
    pub fn step(&mut self, dt_sec: f32, velocity_scaling: f32) {
        let factor = velocity_scaling * dt_sec * 60.0;
        for (pos, vel) in self.positions.iter_mut().zip(&self.velocities) {
            *pos += *vel * factor;
            for axis in 0..3 {
                if pos[axis].abs() > self.radius {
                    pos[axis] *= -DUST_BOUNCE_DAMPING;
                }
            }
        }
    }
}

/// Drift speedup is tied to the discrete gesture, not the eased scatter
/// factor. An idle hand never inherits the boost even though the
/// scatter factor holds its value.
#[inline]
pub fn dust_drift_scale(gesture: GestureState) -> f32 {
    if gesture == GestureState::Open {
        DUST_OPEN_SCALING
    } else {
        1.0
    }
}

/// Constellation star: direction is normalized and pushed out to a
/// fixed shell distance by [`constellation_stars`].
#[derive(Clone, Copy, Debug)]
pub struct Star {
    pub position: Vec3,
    pub color: Vec3,
    pub size: f32,
}

pub const CONSTELLATION_OFFSET: [f32; 3] = [0.0, 0.0, -3.5];
const CONSTELLATION_SHELL: f32 = 7.0;

// Libra: alpha, beta, gamma, sigma, delta.
const STAR_DATA: [([f32; 3], [f32; 3], f32); 5] = [
    ([-0.3, 0.5, -1.0], [1.0, 1.0, 1.0], 0.08),
    ([-0.1, 0.35, -1.1], [1.0, 0.973, 0.882], 0.07),
    ([0.1, 0.4, -1.05], [1.0, 0.973, 0.882], 0.07),
    ([0.2, 0.2, -1.2], [0.91, 0.96, 1.0], 0.06),
    ([0.0, 0.15, -1.25], [0.91, 0.96, 1.0], 0.06),
];

pub fn constellation_stars() -> Vec<Star> {
    STAR_DATA
        .iter()
        .map(|&(dir, color, size)| Star {
            position: Vec3::from(dir).normalize() * CONSTELLATION_SHELL,
            color: Vec3::from(color),
            size,
        })
        .collect()
}

/// Time-driven flicker and pulse for constellation star `index`.
/// Returns `(alpha, scale)`.
#[inline]
pub fn star_glow(time: f32, index: usize) -> (f32, f32) {
    let i = index as f32;
    let alpha = 0.7 + 0.3 * (time * 1.2 * std::f32::consts::TAU + i).sin();
    let scale = 1.0 + 0.05 * (time * 0.8 + i).sin();
    (alpha, scale)
}

// Night-sky backdrop: a shell of faint white points well behind every
// other element. The camera never moves, so the distance fade is baked
// into each star's alpha instead of living in the shader.
pub const STARFIELD_COUNT: usize = 5000;
pub const STARFIELD_INNER_RADIUS: f32 = 100.0;
pub const STARFIELD_DEPTH: f32 = 50.0;

#[derive(Clone, Copy, Debug)]
pub struct SkyStar {
    pub position: Vec3,
    pub size: f32,
    pub alpha: f32,
    /// Twinkle phase offset so the field does not pulse in unison.
    pub phase: f32,
}

pub fn starfield(count: usize, rng: &mut impl Rng) -> Vec<SkyStar> {
    (0..count)
        .map(|_| {
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let depth = rng.gen::<f32>();
            let r = STARFIELD_INNER_RADIUS + depth * STARFIELD_DEPTH;
            SkyStar {
                position: Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.cos(),
                    r * phi.sin() * theta.sin(),
                ),
                size: 0.2 + rng.gen::<f32>() * 0.3,
                // Deeper stars fade toward the void.
                alpha: 0.55 * (1.0 - depth * 0.7),
                phase: rng.gen::<f32>() * std::f32::consts::TAU,
            }
        })
        .collect()
}

/// Slow brightness shimmer for one backdrop star.
#[inline]
pub fn sky_twinkle(time: f32, phase: f32) -> f32 {
    0.8 + 0.2 * (time + phase).sin()
}

// Star topper mesh parameters (five-point star, drawn as a triangle fan)
const TOPPER_OUTER_RADIUS: f32 = 18.0;
const TOPPER_INNER_RADIUS: f32 = 7.5;
const TOPPER_BASE_SCALE: f32 = 0.0072;

/// Flat five-point star outline as a triangle list in the XY plane.
pub fn topper_mesh() -> Vec<Vec3> {
    let points = 5;
    let mut outline = Vec::with_capacity(points * 2);
    for i in 0..points * 2 {
        let angle = i as f32 * std::f32::consts::PI / points as f32 - std::f32::consts::FRAC_PI_2;
        let radius = if i % 2 == 0 {
            TOPPER_OUTER_RADIUS
        } else {
            TOPPER_INNER_RADIUS
        };
        outline.push(Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0));
    }
    let mut triangles = Vec::with_capacity(points * 2 * 3);
    for i in 0..outline.len() {
        triangles.push(Vec3::ZERO);
        triangles.push(outline[i]);
        triangles.push(outline[(i + 1) % outline.len()]);
    }
    triangles
}

/// Accumulated topper spin plus the time-driven pulse.
#[derive(Clone, Copy, Debug, Default)]
pub struct TopperState {
    pub spin_z: f32,
    pub spin_y: f32,
}

impl TopperState {
    /// Advance the spin (per 60 Hz reference frame, like the dust) and
    /// return `(scale, emissive)` for this instant.
    pub fn step(&mut self, time: f32, dt_sec: f32, pulse_speed: f32) -> (f32, f32) {
        let frames = dt_sec * 60.0;
        self.spin_z += 0.017 * frames;
        self.spin_y += 0.0017 * frames;
        let scale = TOPPER_BASE_SCALE * (1.0 + 0.1 * (time * pulse_speed).sin());
        let emissive = (0.6 + 0.4 * (time * pulse_speed * 0.8).sin()) * 2.0;
        (scale, emissive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn strand_layout_covers_all_lines() {
        let mut rng = StdRng::seed_from_u64(1);
        let strands = StrandGeometry::generate(&mut rng);
        assert_eq!(strands.len(), STRAND_ANGLES.len() * STRAND_POINTS);
        // First point of each strand sits at the peak.
        for line in 0..STRAND_ANGLES.len() {
            assert_eq!(strands.progress[line * STRAND_POINTS], 0.0);
            assert_eq!(strands.angles[line * STRAND_POINTS], STRAND_ANGLES[line]);
        }
    }

    #[test]
    fn dust_count_is_fixed_and_bounded() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut dust = DustField::generate(300, DUST_RADIUS, &mut rng);
        assert_eq!(dust.len(), 300);
        for _ in 0..1000 {
            dust.step(1.0 / 60.0, DUST_OPEN_SCALING);
        }
        assert_eq!(dust.len(), 300);
        // Bounce keeps everything close to the bound (one overshoot step
        // is allowed before the sign flip pulls a particle back).
        for p in &dust.positions {
            for axis in 0..3 {
                assert!(p[axis].abs() <= DUST_RADIUS * 1.05);
            }
        }
    }

    #[test]
    fn drift_boost_follows_the_gesture_not_the_factor() {
        assert_eq!(dust_drift_scale(GestureState::Open), DUST_OPEN_SCALING);
        assert_eq!(dust_drift_scale(GestureState::Idle), 1.0);
        assert_eq!(dust_drift_scale(GestureState::Fist), 1.0);
    }

    #[test]
    fn starfield_fills_its_shell_and_fades_with_depth() {
        let mut rng = StdRng::seed_from_u64(8);
        let sky = starfield(2000, &mut rng);
        assert_eq!(sky.len(), 2000);
        for star in &sky {
            let r = star.position.length();
            assert!(r >= STARFIELD_INNER_RADIUS - 1e-3);
            assert!(r <= STARFIELD_INNER_RADIUS + STARFIELD_DEPTH + 1e-3);
            assert!(star.alpha > 0.0 && star.alpha <= 0.55);
        }
        // The near rim is brighter than the far rim.
        let alphas = |lo: f32, hi: f32| -> Vec<f32> {
            sky.iter()
                .filter(|s| {
                    let r = s.position.length();
                    r >= lo && r < hi
                })
                .map(|s| s.alpha)
                .collect()
        };
        let near = alphas(100.0, 110.0);
        let far = alphas(140.0, 151.0);
        let avg = |v: &[f32]| v.iter().sum::<f32>() / v.len().max(1) as f32;
        assert!(avg(&near) > avg(&far));
    }

    #[test]
    fn constellation_sits_on_its_shell() {
        for star in constellation_stars() {
            assert!((star.position.length() - 7.0).abs() < 1e-4);
        }
    }

    #[test]
    fn topper_mesh_is_a_closed_fan() {
        let mesh = topper_mesh();
        assert_eq!(mesh.len() % 3, 0);
        assert_eq!(mesh.len(), 10 * 3);
    }
}
