use glam::Vec3;

// Shared visual tuning constants used by the web frontend.

// Scene layout
pub const TREE_PARTICLE_COUNT: usize = 9600;
pub const TREE_HEIGHT: f32 = 4.0;
pub const TREE_BASE_RADIUS: f32 = 1.33;
pub const TREE_GROUP_OFFSET: [f32; 3] = [0.0, -1.5, 0.0]; // world-space offset of the rotating group

// Tree tiers: particles fill the lower part of each vertical band,
// leaving a visible gap between branch tiers.
pub const TREE_SEGMENTS: usize = 6;
pub const TREE_SEGMENT_FILL: f32 = 0.745;

// Scatter layout when the tree disperses
pub const SCATTER_SPREAD: f32 = 12.0;

// Particle sizing
pub const TREE_SIZE_MIN: f32 = 0.045;
pub const TREE_SIZE_MAX: f32 = 0.08;
pub const ACCENT_RATIO: f32 = 0.3333; // fraction of particles tinted rose-gold

// Tree palette. Silver-white is boosted past 1.0 so the bloom pass picks it up.
pub const TREE_COLOR_SILVER: [f32; 3] = [0.784, 0.784, 1.0]; // #C8C8FF
pub const TREE_COLOR_ACCENT: [f32; 3] = [1.0, 0.482, 0.722]; // #FF7BB8
pub const SILVER_BOOST: f32 = 1.5;

// Shader motion parameters
pub const BLINK_SPEED: f32 = 2.2;
pub const BLINK_AMPLITUDE: f32 = 0.45;
pub const BREATHING_SPEED: f32 = 1.6;
pub const BREATHING_AMPLITUDE: f32 = 0.25;
pub const GLOW_INTENSITY: f32 = 0.186624;
pub const GRAIN_NOISE: f32 = 0.2;

// Gesture classification: average wrist-to-fingertip distance in
// normalized landmark space. The band between the two bounds is a
// deliberate dead zone so the classification does not flicker.
pub const OPEN_DISTANCE: f32 = 0.35;
pub const FIST_DISTANCE: f32 = 0.20;

// Hand-driven rotation
pub const ROTATION_DEADZONE: f32 = 0.002; // |delta x| below this is sensor jitter
pub const ROTATION_SENSITIVITY: f32 = 10.0; // radians per normalized x unit
pub const ROTATION_EASE: f32 = 0.1; // per-frame lerp toward the rotation target
pub const AUTO_SPIN_SPEED: f32 = 0.1; // rad/s while idle with no hand rotation

// Interaction factor easing (exponential smoothing rate per second)
pub const SCATTER_EASE_RATE: f32 = 2.0;

// Dust field
pub const DUST_COUNT: usize = 2000;
pub const DUST_RADIUS: f32 = 8.0;
pub const DUST_VELOCITY: f32 = 0.0025;
pub const DUST_BOUNCE_DAMPING: f32 = 0.98;
pub const DUST_OPEN_SCALING: f32 = 2.5; // drift speedup while the hand is open

// Star topper
pub const TOPPER_POSITION: [f32; 3] = [0.0, 4.0, 0.0];
pub const TOPPER_PULSE_SPEED: f32 = 2.5;
pub const TOPPER_PULSE_SPEED_OPEN: f32 = 4.0;

// Camera
pub const CAMERA_EYE: [f32; 3] = [0.0, 2.5, 7.0];
pub const CAMERA_TARGET: [f32; 3] = [0.0, 1.0, 0.0];
pub const CAMERA_FOVY_DEG: f32 = 50.0;

#[inline]
pub fn tree_group_offset() -> Vec3 {
    Vec3::from(TREE_GROUP_OFFSET)
}
