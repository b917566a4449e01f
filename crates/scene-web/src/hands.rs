//! Hand tracking via the MediaPipe Hands script loaded from the page.
//!
//! The tracking pipeline runs entirely in JS; this module owns the
//! bindings, converts result landmarks into [`HandLandmarks`] and feeds
//! them through a [`GestureTracker`]. The latest classification and any
//! accumulated rotation delta are left in a shared [`HandInput`] for the
//! frame loop to consume.

use glam::Vec3;
use scene_core::{GestureState, GestureTracker, HandLandmarks, LANDMARK_COUNT};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

const HANDS_CDN: &str = "https://cdn.jsdelivr.net/npm/@mediapipe/hands";
const CAMERA_WIDTH: u32 = 640;
const CAMERA_HEIGHT: u32 = 480;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Hands)]
    type Hands;
    #[wasm_bindgen(constructor, js_class = "Hands")]
    fn new(config: &JsValue) -> Hands;
    #[wasm_bindgen(method, js_name = setOptions)]
    fn set_options(this: &Hands, options: &JsValue);
    #[wasm_bindgen(method, js_name = onResults)]
    fn on_results(this: &Hands, callback: &js_sys::Function);
    #[wasm_bindgen(method)]
    fn send(this: &Hands, inputs: &JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_name = Camera)]
    type HandCamera;
    #[wasm_bindgen(constructor, js_class = "Camera")]
    fn new_camera(video: &web::HtmlVideoElement, config: &JsValue) -> HandCamera;
    #[wasm_bindgen(method)]
    fn start(this: &HandCamera) -> js_sys::Promise;
    #[wasm_bindgen(method)]
    fn stop(this: &HandCamera);
}

/// Shared slot the results callback writes and the frame loop reads.
#[derive(Default)]
pub struct HandInput {
    pub gesture: GestureState,
    /// Rotation accumulated since the last frame consumed it.
    pub pending_rotation: f32,
    pub tracking: bool,
}

pub struct TrackingController {
    hands: Rc<Hands>,
    camera: RefCell<Option<HandCamera>>,
    video: web::HtmlVideoElement,
    input: Rc<RefCell<HandInput>>,
    tracker: Rc<RefCell<GestureTracker>>,
}

impl TrackingController {
    pub fn new(
        video: web::HtmlVideoElement,
        input: Rc<RefCell<HandInput>>,
    ) -> anyhow::Result<Rc<Self>> {
        let config = js_sys::Object::new();
        let locate = Closure::<dyn Fn(String) -> String>::new(|file: String| {
            format!("{HANDS_CDN}/{file}")
        });
        js_sys::Reflect::set(&config, &"locateFile".into(), locate.as_ref())
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
        locate.forget();
        let hands = Rc::new(Hands::new(&config));

        let options = js_sys::Object::new();
        let set = |key: &str, value: f64| {
            let _ = js_sys::Reflect::set(&options, &key.into(), &value.into());
        };
        set("maxNumHands", 1.0);
        set("modelComplexity", 1.0);
        set("minDetectionConfidence", 0.5);
        set("minTrackingConfidence", 0.5);
        hands.set_options(&options);

        let tracker = Rc::new(RefCell::new(GestureTracker::new()));
        {
            let input_cb = input.clone();
            let tracker_cb = tracker.clone();
            let on_results = Closure::<dyn FnMut(JsValue)>::new(move |results: JsValue| {
                let mut input = input_cb.borrow_mut();
                if !input.tracking {
                    return;
                }
                let landmarks = landmarks_from_results(&results);
                let sample = tracker_cb.borrow_mut().update(landmarks.as_ref());
                input.gesture = sample.gesture;
                if let Some(delta) = sample.rotation_delta {
                    input.pending_rotation += delta;
                }
            });
            hands.on_results(on_results.as_ref().unchecked_ref());
            on_results.forget();
        }

        Ok(Rc::new(Self {
            hands,
            camera: RefCell::new(None),
            video,
            input,
            tracker,
        }))
    }

    /// Open the webcam and start streaming frames into the tracker.
    /// Fails when camera access is denied or unavailable.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.camera.borrow().is_some() {
            return Ok(());
        }

        let config = js_sys::Object::new();
        let hands = self.hands.clone();
        let video = self.video.clone();
        let on_frame = Closure::<dyn FnMut() -> js_sys::Promise>::new(move || {
            let inputs = js_sys::Object::new();
            let _ = js_sys::Reflect::set(&inputs, &"image".into(), video.as_ref());
            hands.send(&inputs)
        });
        js_sys::Reflect::set(&config, &"onFrame".into(), on_frame.as_ref())
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
        on_frame.forget();
        let _ = js_sys::Reflect::set(&config, &"width".into(), &CAMERA_WIDTH.into());
        let _ = js_sys::Reflect::set(&config, &"height".into(), &CAMERA_HEIGHT.into());

        let camera = HandCamera::new_camera(&self.video, &config);
        JsFuture::from(camera.start())
            .await
            .map_err(|e| anyhow::anyhow!(format!("camera start failed: {:?}", e)))?;
        *self.camera.borrow_mut() = Some(camera);
        self.input.borrow_mut().tracking = true;
        log::info!("hand tracking started");
        Ok(())
    }

    /// Stop the webcam immediately and reset the gesture state so the
    /// scene sees an idle hand.
    pub fn stop(&self) {
        if let Some(camera) = self.camera.borrow_mut().take() {
            camera.stop();
        }
        self.tracker.borrow_mut().reset();
        let mut input = self.input.borrow_mut();
        input.gesture = GestureState::Idle;
        input.pending_rotation = 0.0;
        input.tracking = false;
        log::info!("hand tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        self.camera.borrow().is_some()
    }
}

fn landmarks_from_results(results: &JsValue) -> Option<HandLandmarks> {
    let list = js_sys::Reflect::get(results, &"multiHandLandmarks".into()).ok()?;
    let list: js_sys::Array = list.dyn_into().ok()?;
    let first: js_sys::Array = list.get(0).dyn_into().ok()?;
    if (first.length() as usize) < LANDMARK_COUNT {
        return None;
    }
    let mut out = [Vec3::ZERO; LANDMARK_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
        let point = first.get(i as u32);
        let coord = |name: &str| {
            js_sys::Reflect::get(&point, &name.into())
                .ok()
                .and_then(|v| v.as_f64())
                .map(|v| v as f32)
        };
        *slot = Vec3::new(coord("x")?, coord("y")?, coord("z")?);
    }
    Some(out)
}
