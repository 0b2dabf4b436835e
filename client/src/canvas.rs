use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use js_sys::Reflect;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, MouseEvent, PointerEvent,
    TouchEvent, WheelEvent,
};

use atlas_shared::scene::{BACKGROUND_IMAGE_URL, FALLBACK_COLOR, Pill, scene_offset};
use atlas_shared::{MapScene, Shape, TextBox, TextMeasure, TextStyle};

use crate::app::Listings;
use crate::logos::{LogoSlots, load_image};
use crate::render_loop::RenderScheduler;
use crate::tooltip::{MarkerTooltip, TooltipState};
use crate::viewport::{
    MapFit, ScreenTransform, Viewport, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR, ZoomBounds,
    wheel_zoom_factor,
};

/// Pointer travel below which a press counts as a click rather than a drag.
const CLICK_SLOP_PX: f64 = 5.0;

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Measures with the live 2D context so pills hug the glyphs actually drawn.
struct CanvasMeasure<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl TextMeasure for CanvasMeasure<'_> {
    fn measure(&self, text: &str, style: &TextStyle) -> TextBox {
        apply_text_style(self.ctx, style);
        match self.ctx.measure_text(text) {
            Ok(metrics) => {
                let left = metrics.actual_bounding_box_left();
                let right = metrics.actual_bounding_box_right();
                let ascent = metrics.actual_bounding_box_ascent();
                let descent = metrics.actual_bounding_box_descent();
                TextBox {
                    x: -left,
                    y: -ascent,
                    width: left + right,
                    height: ascent + descent,
                }
            }
            Err(_) => estimate_text_box(text, style),
        }
    }
}

fn estimate_text_box(text: &str, style: &TextStyle) -> TextBox {
    let width = text.chars().count() as f64 * style.font_size * 0.55;
    TextBox {
        x: -width / 2.0,
        y: -0.75 * style.font_size,
        width,
        height: style.font_size,
    }
}

fn apply_text_style(ctx: &CanvasRenderingContext2d, style: &TextStyle) {
    ctx.set_font(&style.css_font());
    ctx.set_text_align("center");
    ctx.set_text_baseline("alphabetic");
    // letterSpacing is not exposed by web-sys yet.
    let _ = Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("letterSpacing"),
        &JsValue::from_str(&format!("{}px", style.letter_spacing)),
    );
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, pill: &Pill) {
    let Pill {
        x,
        y,
        width,
        height,
        radius,
    } = *pill;
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.arc_to(x + width, y, x + width, y + height, r).ok();
    ctx.arc_to(x + width, y + height, x, y + height, r).ok();
    ctx.arc_to(x, y + height, x, y, r).ok();
    ctx.arc_to(x, y, x + width, y, r).ok();
    ctx.close_path();
}

fn circle_path(ctx: &CanvasRenderingContext2d, cx: f64, cy: f64, r: f64) {
    ctx.begin_path();
    ctx.arc(cx, cy, r, 0.0, TAU).ok();
}

fn draw_shape(
    ctx: &CanvasRenderingContext2d,
    shape: &Shape,
    backdrop: Option<&HtmlImageElement>,
    logos: &LogoSlots<HtmlImageElement>,
) {
    match shape {
        Shape::Image {
            url,
            x,
            y,
            width,
            height,
        } => {
            if *url != BACKGROUND_IMAGE_URL {
                return;
            }
            if let Some(img) = backdrop {
                ctx.draw_image_with_html_image_element_and_dw_and_dh(img, *x, *y, *width, *height)
                    .ok();
            }
        }
        Shape::Text { text, x, y, style } => {
            apply_text_style(ctx, style);
            ctx.set_fill_style_str(style.color);
            ctx.fill_text(text, *x, *y).ok();
        }
        Shape::RoundedRect { pill, fill } => {
            rounded_rect_path(ctx, pill);
            ctx.set_fill_style_str(fill);
            ctx.fill();
        }
        Shape::Circle { cx, cy, r, fill } => {
            circle_path(ctx, *cx, *cy, *r);
            ctx.set_fill_style_str(fill);
            ctx.fill();
        }
        Shape::LogoCircle {
            marker,
            cx,
            cy,
            r,
            image_x,
            image_y,
            width,
            height,
        } => {
            let Some(img) = logos.image(*marker) else {
                circle_path(ctx, *cx, *cy, *r);
                ctx.set_fill_style_str(FALLBACK_COLOR);
                ctx.fill();
                return;
            };
            ctx.save();
            circle_path(ctx, *cx, *cy, *r);
            ctx.clip();
            ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img, *image_x, *image_y, *width, *height,
            )
            .ok();
            ctx.restore();
        }
    }
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// CSS size of the element hosting the canvas.
fn host_size(canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<(f64, f64)> {
    let canvas = canvas_ref.get_untracked()?;
    let parent = canvas.parent_element()?;
    let (w, h) = (
        f64::from(parent.client_width()),
        f64::from(parent.client_height()),
    );
    (w > 0.0 && h > 0.0).then_some((w, h))
}

fn window_width() -> Option<f64> {
    web_sys::window()?.inner_width().ok()?.as_f64()
}

/// Zoom range keyed on the browser window, falling back to the container.
fn zoom_bounds(window_width: Option<f64>, container_width: f64) -> ZoomBounds {
    ZoomBounds::for_width(window_width.unwrap_or(container_width))
}

/// Pointer position relative to the canvas' top-left corner.
fn local_point(
    canvas_ref: NodeRef<leptos::html::Canvas>,
    client_x: f64,
    client_y: f64,
) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (client_x - rect.left(), client_y - rect.top())
        })
        .unwrap_or((client_x, client_y))
}

/// Container point expressed in the viewport's output space (padded units
/// before the fit is applied), which is where [`Viewport::zoom_at`] pivots.
fn fit_space(fit: MapFit, x: f64, y: f64) -> (f64, f64) {
    ((x - fit.offset_x) / fit.scale, (y - fit.offset_y) / fit.scale)
}

/// Map-pixel position under a container point, for hit testing.
fn scene_point(fit: MapFit, vp: Viewport, x: f64, y: f64) -> (f64, f64) {
    let (px, py) = ScreenTransform::compose(fit, vp).to_canvas(x, y);
    let (ox, oy) = scene_offset();
    (px - ox, py - oy)
}

/// Apply a pan or zoom. Any view change hides the tooltip; returns whether
/// it was showing.
fn apply_view_change(
    vp: &mut Viewport,
    tip: &mut TooltipState,
    change: impl FnOnce(&mut Viewport),
) -> bool {
    let was_visible = tip.is_visible();
    if was_visible {
        tip.hide();
    }
    change(vp);
    was_visible
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, cursor: &str) {
    if let Some(el) = canvas_ref.get_untracked() {
        web_sys::HtmlElement::style(&el).set_property("cursor", cursor).ok();
    }
}

fn open_in_new_tab(link: &str) {
    if link.is_empty() {
        return;
    }
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url_and_target(link, "_blank");
    }
}

/// Interactive Canvas 2D map: background, area labels and listing markers
/// with pan, zoom, hover tooltips and click-through.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let Listings(listings) = expect_context();

    let scene = Memo::new(move |_| listings.with(|all| MapScene::build(all)));
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let tooltip: RwSignal<TooltipState> = RwSignal::new(TooltipState::default());

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Retained per-scene resources, outside the reactive graph.
    let logos: Rc<RefCell<LogoSlots<HtmlImageElement>>> =
        Rc::new(RefCell::new(LogoSlots::default()));
    let backdrop: Rc<RefCell<Option<HtmlImageElement>>> = Rc::new(RefCell::new(None));

    // Drag and pinch state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pointer = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let logos_render = logos.clone();
    let backdrop_render = backdrop.clone();
    let scheduler = RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let Some((w, h)) = host_size(canvas_ref) else {
            return;
        };

        let dpr = device_pixel_ratio();
        let pw = (w * dpr).round().max(1.0) as u32;
        let ph = (h * dpr).round().max(1.0) as u32;
        if canvas.width() != pw || canvas.height() != ph {
            canvas.set_width(pw);
            canvas.set_height(ph);
        }
        let Some(ctx) = context_2d(canvas) else {
            return;
        };

        ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
        ctx.clear_rect(0.0, 0.0, w, h);

        let screen = ScreenTransform::compose(MapFit::meet(w, h), viewport.get_untracked());
        let (ox, oy) = scene_offset();
        ctx.transform(
            screen.scale,
            0.0,
            0.0,
            screen.scale,
            screen.x + screen.scale * ox,
            screen.y + screen.scale * oy,
        )
        .ok();

        let logos = logos_render.borrow();
        let backdrop = backdrop_render.borrow();
        let measure = CanvasMeasure { ctx: &ctx };
        scene.with_untracked(|scene| {
            for shape in scene.shapes(logos.fills(), &measure) {
                draw_shape(&ctx, &shape, backdrop.as_ref(), &logos);
            }
        });
    });
    let scheduler = Rc::new(scheduler);

    // Background art is shared by every scene; load it once.
    {
        let backdrop = backdrop.clone();
        let sched = scheduler.clone();
        load_image(BACKGROUND_IMAGE_URL, move |outcome| match outcome {
            Some((img, _, _)) => {
                *backdrop.borrow_mut() = Some(img);
                sched.mark_dirty();
            }
            None => web_sys::console::warn_1(&"map background failed to load".into()),
        });
    }

    // New listing set: drop retained logo state and start this generation's loads.
    let sched_scene = scheduler.clone();
    Effect::new(move || {
        scene.with(|scene| {
            let Some(generation) = logos.borrow_mut().sync(scene) else {
                return;
            };
            tooltip.update(TooltipState::hide);
            for (idx, marker) in scene.markers.iter().enumerate() {
                let Some(url) = marker.logo.as_deref() else {
                    continue;
                };
                let logos = logos.clone();
                let sched = sched_scene.clone();
                load_image(url, move |outcome| {
                    if logos.borrow_mut().resolve(generation, idx, outcome) {
                        sched.mark_dirty();
                    }
                });
            }
        });
        sched_scene.mark_dirty();
    });

    let sched_vp = scheduler.clone();
    Effect::new(move || {
        viewport.track();
        sched_vp.mark_dirty();
    });

    // Repaint on window resize; the fit follows the container.
    let sched_resize = scheduler.clone();
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });
        let sched = sched_resize.clone();
        let handler = Closure::<dyn Fn()>::new(move || sched.mark_dirty());
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // Every pan and zoom goes through here.
    let change_view = move |f: &dyn Fn(&mut Viewport, MapFit, ZoomBounds)| {
        let Some((w, h)) = host_size(canvas_ref) else {
            return;
        };
        let fit = MapFit::meet(w, h);
        let bounds = zoom_bounds(window_width(), w);
        let mut vp = viewport.get_untracked();
        let mut tip = tooltip.get_untracked();
        if apply_view_change(&mut vp, &mut tip, |vp| f(vp, fit, bounds)) {
            tooltip.set(tip);
        }
        viewport.set(vp);
    };

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let factor = wheel_zoom_factor(e.delta_y(), e.delta_mode());
        let (x, y) = local_point(canvas_ref, f64::from(e.client_x()), f64::from(e.client_y()));
        change_view(&|vp: &mut Viewport, fit: MapFit, bounds: ZoomBounds| {
            let (px, py) = fit_space(fit, x, y);
            vp.zoom_at(factor, px, py, bounds);
        });
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pointer = last_pointer.clone();
        move |e: PointerEvent| {
            let pos = (f64::from(e.client_x()), f64::from(e.client_y()));
            is_dragging.set(true);
            drag_start.set(pos);
            last_pointer.set(pos);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
            set_cursor(canvas_ref, "grabbing");
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pointer = last_pointer.clone();
        move |e: PointerEvent| {
            let (cx, cy) = (f64::from(e.client_x()), f64::from(e.client_y()));
            if is_dragging.get() {
                let (lx, ly) = last_pointer.get();
                last_pointer.set((cx, cy));
                let (dx, dy) = (cx - lx, cy - ly);
                if dx != 0.0 || dy != 0.0 {
                    change_view(&|vp: &mut Viewport, fit: MapFit, _: ZoomBounds| {
                        vp.pan(dx / fit.scale, dy / fit.scale)
                    });
                }
                return;
            }

            let Some((w, h)) = host_size(canvas_ref) else {
                return;
            };
            let (x, y) = local_point(canvas_ref, cx, cy);
            let (sx, sy) = scene_point(MapFit::meet(w, h), viewport.get_untracked(), x, y);
            let hit = scene.with_untracked(|scene| {
                scene
                    .marker_at(sx, sy)
                    .and_then(|idx| scene.markers.get(idx).map(|m| (idx, m.clone())))
            });
            match hit {
                Some((idx, marker)) => {
                    tooltip.update(|tip| tip.hover(idx, &marker, cx, cy));
                    set_cursor(canvas_ref, "pointer");
                }
                None => {
                    if tooltip.with_untracked(TooltipState::is_visible) {
                        tooltip.update(TooltipState::hide);
                    }
                    set_cursor(canvas_ref, "grab");
                }
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |_: PointerEvent| {
            is_dragging.set(false);
            set_cursor(canvas_ref, "grab");
        }
    };

    let on_pointer_leave = {
        let is_dragging = is_dragging.clone();
        move |_: PointerEvent| {
            is_dragging.set(false);
            if tooltip.with_untracked(TooltipState::is_visible) {
                tooltip.update(TooltipState::hide);
            }
        }
    };

    let on_click = {
        let drag_start = drag_start.clone();
        move |e: MouseEvent| {
            let (cx, cy) = (f64::from(e.client_x()), f64::from(e.client_y()));
            let (sx0, sy0) = drag_start.get();
            if (cx - sx0).abs() >= CLICK_SLOP_PX || (cy - sy0).abs() >= CLICK_SLOP_PX {
                return;
            }
            let Some((w, h)) = host_size(canvas_ref) else {
                return;
            };
            let (x, y) = local_point(canvas_ref, cx, cy);
            let (sx, sy) = scene_point(MapFit::meet(w, h), viewport.get_untracked(), x, y);
            let link = scene.with_untracked(|scene| {
                scene
                    .marker_at(sx, sy)
                    .and_then(|idx| scene.markers.get(idx))
                    .map(|m| m.link.clone())
            });
            if let Some(link) = link {
                open_in_new_tab(&link);
            }
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        let is_dragging = is_dragging.clone();
        move |e: TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                is_dragging.set(false);
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = f64::from(t1.client_x() - t0.client_x());
                let dy = f64::from(t1.client_y() - t0.client_y());
                pinch_dist.set(dx.hypot(dy));
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = f64::from(t1.client_x() - t0.client_x());
            let dy = f64::from(t1.client_y() - t0.client_y());
            let new_dist = dx.hypot(dy);
            let old_dist = pinch_dist.get();
            pinch_dist.set(new_dist);
            if old_dist <= 0.0 || new_dist <= 0.0 {
                return;
            }
            let mid_x = f64::from(t0.client_x() + t1.client_x()) / 2.0;
            let mid_y = f64::from(t0.client_y() + t1.client_y()) / 2.0;
            let (x, y) = local_point(canvas_ref, mid_x, mid_y);
            let factor = new_dist / old_dist;
            change_view(&|vp: &mut Viewport, fit: MapFit, bounds: ZoomBounds| {
                let (px, py) = fit_space(fit, x, y);
                vp.zoom_at(factor, px, py, bounds);
            });
        }
    };

    let zoom_in = move |_: MouseEvent| {
        change_view(&|vp: &mut Viewport, _: MapFit, bounds: ZoomBounds| {
            vp.zoom_by(ZOOM_IN_FACTOR, bounds)
        });
    };
    let zoom_out = move |_: MouseEvent| {
        change_view(&|vp: &mut Viewport, _: MapFit, bounds: ZoomBounds| {
            vp.zoom_by(ZOOM_OUT_FACTOR, bounds)
        });
    };
    let recenter = move |_: MouseEvent| {
        change_view(&|vp: &mut Viewport, _: MapFit, _: ZoomBounds| vp.reset());
    };

    let button_style = "width: 36px; height: 36px; border: none; border-radius: 6px; background: rgba(255,255,255,0.92); color: #1b2b3e; font-size: 1.1rem; font-family: Inter, sans-serif; cursor: pointer; box-shadow: 0 2px 6px rgba(0,0,0,0.2);";

    view! {
        <div style="position: relative; width: 100%; height: 100%;">
            <div
                style="position: absolute; inset: 0; overflow: hidden;"
                on:wheel=on_wheel
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=on_pointer_leave
                on:click=on_click
                on:touchstart=on_touch_start
                on:touchmove=on_touch_move
            >
                <canvas
                    node_ref=canvas_ref
                    style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
                />
            </div>
            <div style="position: absolute; right: 12px; bottom: 12px; display: flex; flex-direction: column; gap: 6px;">
                <button style=button_style title="Zoom in" on:click=zoom_in>"+"</button>
                <button style=button_style title="Zoom out" on:click=zoom_out>"\u{2212}"</button>
                <button style=button_style title="Recenter" on:click=recenter>"\u{21BA}"</button>
            </div>
            <MarkerTooltip state=tooltip />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{MAX_ZOOM, MAX_ZOOM_MOBILE};
    use atlas_shared::scene::{GRID_UNIT, PADDED_HEIGHT, PADDED_WIDTH};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn scene_point_inverts_fit_viewport_and_offset() {
        let fit = MapFit::meet(1200.0, 900.0);
        let vp = Viewport {
            k: 2.0,
            tx: -300.0,
            ty: 40.0,
        };
        let (ox, oy) = scene_offset();
        let marker = (10.0 * GRID_UNIT, 20.0 * GRID_UNIT);

        // Forward: map pixels -> padded canvas -> viewport -> fit.
        let (vx, vy) = vp.apply(marker.0 + ox, marker.1 + oy);
        let sx = fit.offset_x + vx * fit.scale;
        let sy = fit.offset_y + vy * fit.scale;

        let (mx, my) = scene_point(fit, vp, sx, sy);
        assert_close(mx, marker.0);
        assert_close(my, marker.1);
    }

    #[test]
    fn fit_space_maps_container_center_to_padded_center() {
        let fit = MapFit::meet(PADDED_WIDTH * 2.0, PADDED_HEIGHT * 2.0);
        let (px, py) = fit_space(fit, PADDED_WIDTH, PADDED_HEIGHT);
        assert_close(px, PADDED_WIDTH / 2.0);
        assert_close(py, PADDED_HEIGHT / 2.0);
    }

    fn shown_tooltip() -> TooltipState {
        TooltipState {
            marker: Some(3),
            title: "Lab One".into(),
            description: "desc".into(),
            left: 110.0,
            top: 60.0,
        }
    }

    #[test]
    fn pan_hides_tooltip() {
        let fit = MapFit::meet(1200.0, 900.0);
        let mut vp = Viewport::IDENTITY;
        let mut tip = shown_tooltip();

        assert!(apply_view_change(&mut vp, &mut tip, |vp| {
            vp.pan(30.0 / fit.scale, -12.0 / fit.scale)
        }));
        assert!(!tip.is_visible());
        assert_close(vp.tx, 30.0 / fit.scale);
        assert_close(vp.ty, -12.0 / fit.scale);
    }

    #[test]
    fn wheel_zoom_hides_tooltip() {
        let fit = MapFit::meet(1200.0, 900.0);
        let bounds = ZoomBounds::for_width(1200.0);
        let mut vp = Viewport::IDENTITY;
        let mut tip = shown_tooltip();
        let factor = wheel_zoom_factor(-100.0, 0);

        apply_view_change(&mut vp, &mut tip, |vp| {
            let (px, py) = fit_space(fit, 400.0, 300.0);
            vp.zoom_at(factor, px, py, bounds);
        });
        assert!(!tip.is_visible());
        assert!(vp.k > 1.0);
    }

    #[test]
    fn button_zoom_and_recenter_hide_tooltip() {
        let bounds = ZoomBounds::for_width(1200.0);
        let mut vp = Viewport::IDENTITY;
        let mut tip = shown_tooltip();

        apply_view_change(&mut vp, &mut tip, |vp| vp.zoom_by(ZOOM_IN_FACTOR, bounds));
        assert!(!tip.is_visible());
        assert_close(vp.k, ZOOM_IN_FACTOR);

        let mut tip = shown_tooltip();
        assert!(apply_view_change(&mut vp, &mut tip, Viewport::reset));
        assert!(!tip.is_visible());
        assert!(vp.is_identity());
    }

    #[test]
    fn hidden_tooltip_is_left_untouched() {
        let bounds = ZoomBounds::for_width(1200.0);
        let mut vp = Viewport::IDENTITY;
        let mut tip = TooltipState::default();

        assert!(!apply_view_change(&mut vp, &mut tip, |vp| {
            vp.zoom_by(ZOOM_OUT_FACTOR, bounds)
        }));
        assert_eq!(tip, TooltipState::default());
        assert_close(vp.k, ZOOM_OUT_FACTOR);
    }

    #[test]
    fn zoom_range_follows_window_width() {
        // 800px window with a padded 752px container keeps the desktop range.
        assert_eq!(zoom_bounds(Some(800.0), 752.0).max, MAX_ZOOM);
        assert_eq!(zoom_bounds(Some(767.0), 719.0).max, MAX_ZOOM_MOBILE);
        assert_eq!(zoom_bounds(None, 700.0).max, MAX_ZOOM_MOBILE);
    }

    #[test]
    fn estimated_text_box_is_centered_on_anchor() {
        let style = TextStyle {
            font_size: 10.0,
            font_weight: 400,
            letter_spacing: 0.0,
            color: "#000",
        };
        let bbox = estimate_text_box("abcd", &style);
        assert_close(bbox.x, -bbox.width / 2.0);
        assert!(bbox.y < 0.0);
    }
}
