#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use atlas_shared::{MapScene, MarkerFill};

const ONLOAD_HANDLE_KEY: &str = "__atlasLogoOnload";
const ONERROR_HANDLE_KEY: &str = "__atlasLogoOnerror";

/// Per-marker fill state and decoded images for the scene currently shown.
///
/// Every load is tagged with the generation it was started for; a new scene
/// bumps the generation so completions for the old one are dropped.
pub struct LogoSlots<I> {
    fingerprint: Option<u32>,
    generation: u64,
    fills: Vec<MarkerFill>,
    images: Vec<Option<I>>,
}

impl<I> Default for LogoSlots<I> {
    fn default() -> Self {
        Self {
            fingerprint: None,
            generation: 0,
            fills: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl<I> LogoSlots<I> {
    /// Adopt `scene`. Returns the new generation when retained state was torn down.
    pub fn sync(&mut self, scene: &MapScene) -> Option<u64> {
        if self.fingerprint == Some(scene.fingerprint()) {
            return None;
        }
        self.fingerprint = Some(scene.fingerprint());
        self.generation = self.generation.wrapping_add(1);
        self.fills = scene.initial_fills();
        self.images = scene.markers.iter().map(|_| None).collect();
        Some(self.generation)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fills(&self) -> &[MarkerFill] {
        &self.fills
    }

    pub fn image(&self, marker: usize) -> Option<&I> {
        self.images.get(marker).and_then(Option::as_ref)
    }

    /// Record a finished load. Returns false when the result is stale.
    pub fn resolve(
        &mut self,
        generation: u64,
        marker: usize,
        outcome: Option<(I, f64, f64)>,
    ) -> bool {
        if generation != self.generation || marker >= self.fills.len() {
            return false;
        }
        if self.fills[marker] != MarkerFill::Pending {
            return false;
        }
        match outcome {
            Some((image, width, height)) => {
                self.fills[marker] = MarkerFill::Loaded { width, height };
                self.images[marker] = Some(image);
            }
            None => self.fills[marker] = MarkerFill::Failed,
        }
        true
    }
}

/// Start loading one image; `on_done` receives the element and its natural
/// size, or `None` on failure.
pub fn load_image(
    src: &str,
    on_done: impl FnOnce(Option<(HtmlImageElement, f64, f64)>) + 'static,
) {
    let Ok(img) = HtmlImageElement::new() else {
        on_done(None);
        return;
    };

    let on_done = Rc::new(RefCell::new(Some(on_done)));

    let img_for_load = img.clone();
    let on_done_load = on_done.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);
        let width = f64::from(img_for_load.natural_width());
        let height = f64::from(img_for_load.natural_height());
        if let Some(done) = on_done_load.borrow_mut().take() {
            done(Some((img_for_load.clone(), width, height)));
        }
    });

    let img_for_error = img.clone();
    let on_done_error = on_done;
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        if let Some(done) = on_done_error.borrow_mut().take() {
            done(None);
        }
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONLOAD_HANDLE_KEY),
        &onload_js,
    );
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONERROR_HANDLE_KEY),
        &onerror_js,
    );
    img.set_src(src);
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_shared::Listing;

    fn listing(id: &str, logo: Option<&str>) -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Org {id}"),
            "x": 10.0,
            "y": 20.0,
            "mapLogo": logo,
        }))
        .expect("listing")
    }

    fn scene(listings: &[Listing]) -> MapScene {
        MapScene::build(listings)
    }

    #[test]
    fn sync_resets_only_on_fingerprint_change() {
        let mut slots: LogoSlots<()> = LogoSlots::default();
        let first = scene(&[listing("a", Some("https://cdn.example/a.png"))]);
        assert_eq!(slots.sync(&first), Some(1));
        assert_eq!(slots.sync(&first), None);
        assert_eq!(slots.fills(), &[MarkerFill::Pending]);

        let second = scene(&[listing("b", None)]);
        assert_eq!(slots.sync(&second), Some(2));
        assert_eq!(slots.fills(), &[MarkerFill::NoLogo]);
    }

    #[test]
    fn stale_generation_results_are_discarded() {
        let mut slots: LogoSlots<()> = LogoSlots::default();
        let first = scene(&[listing("a", Some("https://cdn.example/a.png"))]);
        let old_generation = slots.sync(&first).expect("fresh scene");

        let second = scene(&[
            listing("a", Some("https://cdn.example/a.png")),
            listing("b", Some("https://cdn.example/b.png")),
        ]);
        slots.sync(&second).expect("changed scene");

        assert!(!slots.resolve(old_generation, 0, Some(((), 10.0, 10.0))));
        assert_eq!(slots.fills()[0], MarkerFill::Pending);
        assert!(slots.image(0).is_none());
    }

    #[test]
    fn resolve_sets_single_terminal_fill() {
        let mut slots: LogoSlots<()> = LogoSlots::default();
        let s = scene(&[
            listing("a", Some("https://cdn.example/a.png")),
            listing("b", Some("https://cdn.example/b.png")),
        ]);
        let generation = slots.sync(&s).expect("fresh scene");

        assert!(slots.resolve(generation, 0, Some(((), 200.0, 100.0))));
        assert!(slots.resolve(generation, 1, None));
        assert_eq!(
            slots.fills(),
            &[
                MarkerFill::Loaded {
                    width: 200.0,
                    height: 100.0
                },
                MarkerFill::Failed
            ]
        );
        assert!(slots.image(0).is_some());

        // A second completion for an already-resolved marker is ignored.
        assert!(!slots.resolve(generation, 1, Some(((), 5.0, 5.0))));
        assert_eq!(slots.fills()[1], MarkerFill::Failed);
    }
}
