//! Wish generation against the hosted language-model endpoint.
//!
//! Transport failures surface as errors so the caller can keep the
//! typed topic for a retry. A response that arrives but cannot be read
//! as a wish silently degrades to the built-in fallback instead.

use scene_core::{parse_wish_or_fallback, wish_prompt, Wish};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

const MODEL_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Ask the model for a wish about `topic`.
pub async fn request_wish(topic: &str) -> anyhow::Result<Wish> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let api_key = api_key(&window);

    let body = serde_json::json!({
        "contents": [{ "parts": [{ "text": wish_prompt(topic) }] }],
        "generationConfig": { "responseMimeType": "application/json" },
    })
    .to_string();

    let opts = web::RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(web::RequestMode::Cors);
    opts.set_body(&JsValue::from_str(&body));

    let url = format!("{MODEL_URL}?key={api_key}");
    let request = web::Request::new_with_str_and_init(&url, &opts)
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| anyhow::anyhow!(format!("wish request failed: {:?}", e)))?;
    let response: web::Response = response
        .dyn_into()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    if !response.ok() {
        anyhow::bail!("wish request failed: HTTP {}", response.status());
    }
    let text = JsFuture::from(
        response
            .text()
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?,
    )
    .await
    .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    let text = text.as_string().unwrap_or_default();

    // The generated wish rides inside the first candidate. Anything
    // unexpected in the envelope falls through to the fallback wish.
    let generated = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|envelope| {
            envelope["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .map(str::to_owned)
        })
        .unwrap_or_default();
    Ok(parse_wish_or_fallback(&generated))
}

/// The page provides the key as a global; an absent key still sends the
/// request so local mocks without auth keep working.
fn api_key(window: &web::Window) -> String {
    js_sys::Reflect::get(window.as_ref(), &"WISH_API_KEY".into())
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}
