//! DOM overlay: gesture status, notices and the wish display.

use crate::dom::element_by_id;
use scene_core::{GestureState, Wish};
use std::cell::Cell;
use web_sys as web;

pub struct Hud {
    gesture_label: web::Element,
    notice: web::Element,
    wish_panel: web::Element,
    wish_message: web::Element,
    wish_author: web::Element,
    last_gesture: Cell<Option<(GestureState, bool)>>,
}

impl Hud {
    pub fn from_document(document: &web::Document) -> anyhow::Result<Self> {
        Ok(Self {
            gesture_label: element_by_id(document, "gesture-label")?,
            notice: element_by_id(document, "notice")?,
            wish_panel: element_by_id(document, "wish-panel")?,
            wish_message: element_by_id(document, "wish-message")?,
            wish_author: element_by_id(document, "wish-author")?,
            last_gesture: Cell::new(None),
        })
    }

    /// Called every frame; only touches the DOM when the label changes.
    pub fn set_gesture(&self, gesture: GestureState, tracking: bool) {
        if self.last_gesture.get() == Some((gesture, tracking)) {
            return;
        }
        self.last_gesture.set(Some((gesture, tracking)));
        let label = if !tracking {
            "tracking off"
        } else {
            match gesture {
                GestureState::Idle => "watching",
                GestureState::Open => "open hand",
                GestureState::Fist => "fist",
            }
        };
        self.gesture_label.set_text_content(Some(label));
    }

    pub fn show_wish(&self, wish: &Wish) {
        self.wish_message.set_text_content(Some(&wish.message));
        self.wish_author
            .set_text_content(Some(&format!("\u{2014} {}", wish.author)));
        let _ = self.wish_panel.set_attribute("style", "");
    }

    pub fn set_notice(&self, message: &str) {
        self.notice.set_text_content(Some(message));
        let _ = self.notice.set_attribute("style", "");
    }

    pub fn clear_notice(&self) {
        self.notice.set_text_content(Some(""));
        let _ = self.notice.set_attribute("style", "display:none");
    }
}
