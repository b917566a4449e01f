pub mod ambient;
pub mod constants;
pub mod gesture;
pub mod interaction;
pub mod state;
pub mod trails;
pub mod tree;
pub mod wish;

pub static TREE_WGSL: &str = include_str!("../shaders/tree.wgsl");
pub static RIBBON_WGSL: &str = include_str!("../shaders/ribbon.wgsl");
pub static STRAND_WGSL: &str = include_str!("../shaders/strand.wgsl");
pub static SPRITE_WGSL: &str = include_str!("../shaders/sprite.wgsl");
pub static TRAIL_WGSL: &str = include_str!("../shaders/trail.wgsl");
pub static TOPPER_WGSL: &str = include_str!("../shaders/topper.wgsl");
pub static POST_WGSL: &str = include_str!("../shaders/post.wgsl");

pub use ambient::{
    constellation_stars, dust_drift_scale, sky_twinkle, star_glow, starfield, topper_mesh,
    DustField, SkyStar, SpiralGeometry, Star, StrandGeometry, TopperState, STARFIELD_COUNT,
};
pub use constants::*;
pub use gesture::{
    GestureSample, GestureState, GestureTracker, HandLandmarks, FINGERTIPS, LANDMARK_COUNT, WRIST,
};
pub use interaction::InteractionState;
pub use state::Camera;
pub use trails::{MeteorPool, MeteorSlot, StreakPool, StreakSlot};
pub use tree::TreeGeometry;
pub use wish::{parse_wish, parse_wish_or_fallback, wish_prompt, Wish, WishParseError};
