//! Per-frame animation step and the requestAnimationFrame loop.

use crate::hands::HandInput;
use crate::overlay::Hud;
use crate::render::{self, SceneFrame, SpriteInstance, TrailInstance};
use glam::{Mat4, Vec3};
use instant::Instant;
use rand::rngs::StdRng;
use scene_core::ambient::CONSTELLATION_OFFSET;
use scene_core::{
    dust_drift_scale, sky_twinkle, star_glow, tree_group_offset, DustField, GestureState,
    InteractionState, MeteorPool, SkyStar, Star, StreakPool, TopperState, TOPPER_POSITION,
    TOPPER_PULSE_SPEED, TOPPER_PULSE_SPEED_OPEN,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

const DUST_SPRITE_SIZE: f32 = 0.02;
const DUST_COLOR: [f32; 3] = [0.8, 0.85, 1.0];
const DUST_ALPHA: f32 = 0.5;
const SKY_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

pub struct FrameContext<'a> {
    pub canvas: web::HtmlCanvasElement,
    pub gpu: Option<render::GpuState<'a>>,
    pub hud: Rc<Hud>,
    pub hand_input: Rc<RefCell<HandInput>>,

    pub interaction: InteractionState,
    pub dust: DustField,
    pub stars: Vec<Star>,
    pub sky: Vec<SkyStar>,
    pub streaks: StreakPool,
    pub meteors: MeteorPool,
    pub topper: TopperState,
    pub rng: StdRng,

    pub last_instant: Instant,
    pub time: f32,
}

impl<'a> FrameContext<'a> {
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt_sec = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.time += dt_sec;

        let (gesture, rotation_delta, tracking) = {
            let mut input = self.hand_input.borrow_mut();
            let delta = std::mem::take(&mut input.pending_rotation);
            (input.gesture, delta, input.tracking)
        };
        if rotation_delta != 0.0 {
            self.interaction.apply_rotation_delta(rotation_delta);
        }
        self.interaction.step(gesture, dt_sec);
        self.hud.set_gesture(gesture, tracking);

        let scatter = self.interaction.scatter;
        self.dust.step(dt_sec, dust_drift_scale(gesture));
        self.streaks.step(self.time, &mut self.rng);
        self.meteors.step(self.time, &mut self.rng);

        let pulse_speed = if gesture == GestureState::Open {
            TOPPER_PULSE_SPEED_OPEN
        } else {
            TOPPER_PULSE_SPEED
        };
        let (topper_scale, topper_emissive) = self.topper.step(self.time, dt_sec, pulse_speed);
        let group = Mat4::from_translation(tree_group_offset())
            * Mat4::from_rotation_y(self.interaction.rotation);
        let topper_model = group
            * Mat4::from_translation(Vec3::from(TOPPER_POSITION))
            * Mat4::from_rotation_z(self.topper.spin_z)
            * Mat4::from_rotation_y(self.topper.spin_y)
            * Mat4::from_scale(Vec3::splat(topper_scale));

        let mut sprites =
            Vec::with_capacity(self.dust.len() + self.sky.len() + self.stars.len());
        for pos in &self.dust.positions {
            sprites.push(SpriteInstance {
                pos: pos.to_array(),
                size: DUST_SPRITE_SIZE,
                color: DUST_COLOR,
                alpha: DUST_ALPHA,
            });
        }
        for star in &self.sky {
            sprites.push(SpriteInstance {
                pos: star.position.to_array(),
                size: star.size,
                color: SKY_COLOR,
                alpha: star.alpha * sky_twinkle(self.time, star.phase),
            });
        }
        for (i, star) in self.stars.iter().enumerate() {
            let (alpha, scale) = star_glow(self.time, i);
            sprites.push(SpriteInstance {
                pos: (star.position + Vec3::from(CONSTELLATION_OFFSET)).to_array(),
                size: star.size * scale,
                color: star.color.to_array(),
                alpha,
            });
        }

        let hide_ornaments = gesture == GestureState::Open;
        let mut trails =
            Vec::with_capacity(self.streaks.slots().len() + self.meteors.slots().len());
        for slot in self.streaks.slots() {
            if hide_ornaments {
                trails.push(TrailInstance::hidden());
            } else {
                // Streaks belong to the rotating group; meteors stay in
                // world space.
                trails.push(TrailInstance::new(
                    slot.transform_in(group),
                    slot.shaded_color(),
                ));
            }
        }
        for slot in self.meteors.slots() {
            trails.push(TrailInstance::new(
                slot.transform(),
                slot.shaded_color(self.time),
            ));
        }

        if let Some(gpu) = &mut self.gpu {
            // Keep the surface sized to the canvas backing store.
            let w = self.canvas.width();
            let h = self.canvas.height();
            gpu.resize_if_needed(w, h);
            let scene = SceneFrame {
                time: self.time,
                scatter,
                rotation: self.interaction.rotation,
                hide_ornaments,
                sprites,
                trails,
                topper_model,
                topper_emissive,
            };
            if let Err(e) = gpu.render(&scene) {
                log::error!("render error: {:?}", e);
            }
        }
    }
}

pub async fn init_gpu(canvas: &web::HtmlCanvasElement) -> Option<render::GpuState<'static>> {
    // leak a canvas clone to satisfy 'static lifetime for surface
    let leaked_canvas = Box::leak(Box::new(canvas.clone()));
    match render::GpuState::new(leaked_canvas).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("WebGPU init error: {:?}", e);
            None
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext<'static>>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        if let Some(w) = web::window() {
            let _ = w.request_animation_frame(
                tick_clone
                    .borrow()
                    .as_ref()
                    .unwrap()
                    .as_ref()
                    .unchecked_ref(),
            );
        }
    }) as Box<dyn FnMut()>));
    if let Some(w) = web::window() {
        let _ = w.request_animation_frame(tick.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}
