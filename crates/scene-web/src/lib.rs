#![cfg(target_arch = "wasm32")]

mod dom;
mod frame;
mod hands;
mod overlay;
mod render;
mod wish_service;

use frame::FrameContext;
use hands::{HandInput, TrackingController};
use instant::Instant;
use overlay::Hud;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene_core::{
    constellation_stars, starfield, DustField, InteractionState, MeteorPool, StreakPool,
    TopperState, DUST_COUNT, DUST_RADIUS, STARFIELD_COUNT,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("scene-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let canvas: web::HtmlCanvasElement = dom::element_by_id(&document, "scene-canvas")?;
    dom::sync_canvas_backing_size(&canvas);
    dom::install_resize_sync(&window, &canvas);

    let hud = Rc::new(Hud::from_document(&document)?);
    hud.clear_notice();

    let hand_input = Rc::new(RefCell::new(HandInput::default()));
    let video: web::HtmlVideoElement = dom::element_by_id(&document, "tracking-video")?;
    let controller = TrackingController::new(video, hand_input.clone())?;

    let gpu = frame::init_gpu(&canvas).await;
    if gpu.is_none() {
        hud.set_notice("WebGPU is unavailable in this browser; the scene cannot start.");
    }

    let mut rng = StdRng::from_entropy();
    let dust = DustField::generate(DUST_COUNT, DUST_RADIUS, &mut rng);
    let sky = starfield(STARFIELD_COUNT, &mut rng);
    let meteors = MeteorPool::new(&mut rng);
    let frame_ctx = Rc::new(RefCell::new(FrameContext {
        canvas: canvas.clone(),
        gpu,
        hud: hud.clone(),
        hand_input: hand_input.clone(),
        interaction: InteractionState::new(),
        dust,
        stars: constellation_stars(),
        sky,
        streaks: StreakPool::new(),
        meteors,
        topper: TopperState::default(),
        rng,
        last_instant: Instant::now(),
        time: 0.0,
    }));

    // Tracking toggle: off is synchronous, on goes through the async
    // camera handshake and may be declined by the user.
    {
        let controller = controller.clone();
        let hud = hud.clone();
        let frame_ctx = frame_ctx.clone();
        dom::add_click_listener(&document, "tracking-toggle", move || {
            if controller.is_tracking() {
                controller.stop();
                frame_ctx.borrow_mut().interaction.reset();
                return;
            }
            let controller = controller.clone();
            let hud = hud.clone();
            spawn_local(async move {
                match controller.start().await {
                    Ok(()) => hud.clear_notice(),
                    Err(e) => {
                        log::warn!("camera unavailable: {e:#}");
                        hud.set_notice("Camera access is required for hand tracking.");
                    }
                }
            });
        });
    }

    // Wish form: transport failure keeps the topic for a retry, a
    // successful (or silently degraded) wish clears it.
    {
        let form: web::HtmlFormElement = dom::element_by_id(&document, "wish-form")?;
        let topic_input: web::HtmlInputElement = dom::element_by_id(&document, "wish-topic")?;
        let submit: web::HtmlButtonElement = dom::element_by_id(&document, "wish-submit")?;
        let hud = hud.clone();
        dom::add_submit_listener(&form, move || {
            let topic = topic_input.value().trim().to_owned();
            if topic.is_empty() || submit.disabled() {
                return;
            }
            submit.set_disabled(true);
            let hud = hud.clone();
            let topic_input = topic_input.clone();
            let submit = submit.clone();
            spawn_local(async move {
                match wish_service::request_wish(&topic).await {
                    Ok(wish) => {
                        hud.show_wish(&wish);
                        hud.clear_notice();
                        topic_input.set_value("");
                    }
                    Err(e) => {
                        log::warn!("wish request failed: {e:#}");
                        hud.set_notice("The stars are quiet right now; try again in a moment.");
                    }
                }
                submit.set_disabled(false);
            });
        });
    }

    frame::start_loop(frame_ctx);
    Ok(())
}
