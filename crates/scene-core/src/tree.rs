//! Procedural generation of the tree point cloud.

use crate::constants::*;
use glam::Vec3;
use rand::prelude::*;

/// Static per-particle buffers for the tree. Generated once at mount;
/// positions, seeds and colors never change afterwards — all motion is
/// computed in the vertex shader from these plus per-frame uniforms.
#[derive(Clone, Debug)]
pub struct TreeGeometry {
    pub positions: Vec<Vec3>,
    /// Where each particle flies when the tree disperses.
    pub scatter_targets: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub seeds: Vec<f32>,
}

impl TreeGeometry {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Distribute `count` particles over a cone of `height` and
    /// `base_radius`, split into [`TREE_SEGMENTS`] vertical tiers. Only
    /// the lower [`TREE_SEGMENT_FILL`] of each tier's height band is
    /// populated, which reads as distinct branch layers.
    pub fn generate(count: usize, height: f32, base_radius: f32, rng: &mut impl Rng) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut scatter_targets = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);
        let mut seeds = Vec::with_capacity(count);

        let silver = Vec3::from(TREE_COLOR_SILVER) * SILVER_BOOST;
        let accent = Vec3::from(TREE_COLOR_ACCENT);

        for _ in 0..count {
            let segment = rng.gen_range(0..TREE_SEGMENTS);
            let local = rng.gen::<f32>() * TREE_SEGMENT_FILL;
            let h_ratio = (segment as f32 + local) / TREE_SEGMENTS as f32;
            let radius = (1.0 - h_ratio) * base_radius;
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;

            positions.push(Vec3::new(
                angle.cos() * radius,
                h_ratio * height,
                angle.sin() * radius,
            ));

            scatter_targets.push(Vec3::new(
                (rng.gen::<f32>() - 0.5) * SCATTER_SPREAD * 2.0,
                (rng.gen::<f32>() - 0.2) * SCATTER_SPREAD * 1.5,
                (rng.gen::<f32>() - 0.5) * SCATTER_SPREAD,
            ));

            let is_accent = rng.gen::<f32>() < ACCENT_RATIO;
            colors.push(if is_accent { accent } else { silver });

            let base = TREE_SIZE_MIN + (TREE_SIZE_MAX - TREE_SIZE_MIN) * rng.gen::<f32>();
            let multiplier = if is_accent {
                2.0 + rng.gen::<f32>()
            } else {
                1.0 + rng.gen::<f32>()
            };
            sizes.push(base * multiplier);
            seeds.push(rng.gen());
        }

        Self {
            positions,
            scatter_targets,
            colors,
            sizes,
            seeds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn particle_count_is_exact_and_buffers_agree() {
        let mut rng = StdRng::seed_from_u64(7);
        let tree = TreeGeometry::generate(1000, TREE_HEIGHT, TREE_BASE_RADIUS, &mut rng);
        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.scatter_targets.len(), 1000);
        assert_eq!(tree.colors.len(), 1000);
        assert_eq!(tree.sizes.len(), 1000);
        assert_eq!(tree.seeds.len(), 1000);
    }

    #[test]
    fn particles_lie_on_the_cone() {
        let mut rng = StdRng::seed_from_u64(11);
        let tree = TreeGeometry::generate(2000, TREE_HEIGHT, TREE_BASE_RADIUS, &mut rng);
        for p in &tree.positions {
            assert!(p.y >= 0.0 && p.y <= TREE_HEIGHT);
            let h_ratio = p.y / TREE_HEIGHT;
            let max_radius = (1.0 - h_ratio) * TREE_BASE_RADIUS;
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r <= max_radius + 1e-4, "radius {r} exceeds cone at {h_ratio}");
        }
    }

    #[test]
    fn tier_gaps_are_left_unpopulated() {
        let mut rng = StdRng::seed_from_u64(3);
        let tree = TreeGeometry::generate(4000, TREE_HEIGHT, TREE_BASE_RADIUS, &mut rng);
        let band = TREE_HEIGHT / TREE_SEGMENTS as f32;
        for p in &tree.positions {
            let local = (p.y % band) / band;
            assert!(local <= TREE_SEGMENT_FILL + 1e-4, "particle in tier gap");
        }
    }

    #[test]
    fn seeds_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let tree = TreeGeometry::generate(500, TREE_HEIGHT, TREE_BASE_RADIUS, &mut rng);
        assert!(tree.seeds.iter().all(|s| (0.0..1.0).contains(s)));
    }
}
