use atlas_shared::scene::{PADDED_HEIGHT, PADDED_WIDTH};

/// Windows narrower than this get a deeper zoom range.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 8.0;
pub const MAX_ZOOM_MOBILE: f64 = 25.0;
pub const ZOOM_IN_FACTOR: f64 = 1.5;
pub const ZOOM_OUT_FACTOR: f64 = 0.75;

/// Wheel delta (pixel mode) to log2 zoom change.
const WHEEL_SENSITIVITY: f64 = 0.002;
const WHEEL_LINE_SENSITIVITY: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    pub fn for_width(window_width: f64) -> Self {
        let max = if window_width < MOBILE_BREAKPOINT_PX {
            MAX_ZOOM_MOBILE
        } else {
            MAX_ZOOM
        };
        Self { min: MIN_ZOOM, max }
    }

    fn clamp(&self, k: f64) -> f64 {
        k.clamp(self.min, self.max)
    }
}

/// Placement of the padded map inside its container: scaled to fit
/// entirely, centered horizontally, aligned to the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFit {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl MapFit {
    pub fn meet(container_w: f64, container_h: f64) -> Self {
        if container_w <= 0.0 || container_h <= 0.0 {
            return Self {
                scale: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }
        let scale = (container_w / PADDED_WIDTH).min(container_h / PADDED_HEIGHT);
        Self {
            scale,
            offset_x: (container_w - PADDED_WIDTH * scale) / 2.0,
            offset_y: 0.0,
        }
    }
}

/// User pan/zoom on top of the fit, in padded-canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub k: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k + self.tx, y * self.k + self.ty)
    }

    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.k, (y - self.ty) / self.k)
    }

    /// Scale by `factor` keeping the canvas point `(px, py)` fixed.
    pub fn zoom_at(&mut self, factor: f64, px: f64, py: f64, bounds: ZoomBounds) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_k = bounds.clamp(self.k * factor);
        let ratio = new_k / self.k;
        self.tx = px - (px - self.tx) * ratio;
        self.ty = py - (py - self.ty) * ratio;
        self.k = new_k;
    }

    /// Button zoom around the middle of the map.
    pub fn zoom_by(&mut self, factor: f64, bounds: ZoomBounds) {
        self.zoom_at(factor, PADDED_WIDTH / 2.0, PADDED_HEIGHT / 2.0, bounds);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
    }

    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }
}

/// Zoom factor for a wheel event. `delta_mode` follows the DOM constants
/// (0 pixels, 1 lines, 2 pages).
pub fn wheel_zoom_factor(delta_y: f64, delta_mode: u32) -> f64 {
    let sensitivity = match delta_mode {
        0 => WHEEL_SENSITIVITY,
        1 => WHEEL_LINE_SENSITIVITY,
        _ => 1.0,
    };
    2f64.powf(-delta_y * sensitivity)
}

/// Screen-space mapping from padded-canvas units: `fit ∘ viewport`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl ScreenTransform {
    pub fn compose(fit: MapFit, vp: Viewport) -> Self {
        Self {
            scale: fit.scale * vp.k,
            x: fit.offset_x + fit.scale * vp.tx,
            y: fit.offset_y + fit.scale * vp.ty,
        }
    }

    pub fn to_canvas(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.x) / self.scale, (sy - self.y) / self.scale)
    }
}
