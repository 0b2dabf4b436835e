//! Declarative description of the listings map.
//!
//! [`MapScene::build`] turns listings into pure geometry; [`MapScene::shapes`]
//! flattens it into ordered draw commands for a retained-mode renderer. All
//! coordinates are in the background image's native pixel space. The caller's
//! viewport adds [`scene_offset`] and its own pan/zoom on top.

use crc32fast::Hasher;

use crate::listing::{Listing, ScaleTier};

pub const MAP_WIDTH: f64 = 2485.0;
pub const MAP_HEIGHT: f64 = 1355.0;
pub const PADDING_FACTOR: f64 = 1.1;
pub const PADDED_WIDTH: f64 = MAP_WIDTH * PADDING_FACTOR;
pub const PADDED_HEIGHT: f64 = MAP_HEIGHT * PADDING_FACTOR;
/// Pixels per normalized coordinate unit.
pub const GRID_UNIT: f64 = MAP_WIDTH / 60.0;
pub const BACKGROUND_IMAGE_URL: &str = "https://cdn.prod.website-files.com/65380b51b01b69a63d681e04/67e5dce03ad758280cd8367c_Map%201.5.1.svg";

pub const MAP_TITLE: &str = "Map of AI Existential Safety";
const TITLE_FONT_SIZE: f64 = 72.0;
const TITLE_LETTER_SPACING: f64 = -2.16;

pub const BASE_LOGO_SIZE: f64 = 64.0;
const LOGO_GLOBAL_SCALE: f64 = 1.0;
const MARKER_PADDING: f64 = 2.0;
const MARKER_LABEL_EMPHASIS: f64 = 1.5;

const AREA_LABEL_SCALE: f64 = 1.75;
const AREA_LABEL_FONT_SIZE: f64 = 14.0 * AREA_LABEL_SCALE;
const AREA_LABEL_PAD_X: f64 = 14.0 * AREA_LABEL_SCALE;
const AREA_LABEL_PAD_Y: f64 = 7.0 * AREA_LABEL_SCALE;

pub const FONT_FAMILY: &str = "Inter, sans-serif";
pub const TITLE_COLOR: &str = "#fff";
pub const AREA_LABEL_COLOR: &str = "#fff";
pub const AREA_PILL_COLOR: &str = "rgba(27, 43, 62, 0.6)";
pub const BADGE_COLOR: &str = "#fff";
pub const NO_LOGO_COLOR: &str = "red";
pub const FALLBACK_COLOR: &str = "#f70";
pub const MARKER_LABEL_COLOR: &str = "#000";
pub const MARKER_PILL_COLOR: &str = "#fff";

/// Static region label placed in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaLabelDef {
    pub label: &'static str,
    pub x: f64,
    pub y: f64,
}

const fn area(label: &'static str, x: f64, y: f64) -> AreaLabelDef {
    AreaLabelDef { label, x, y }
}

pub const AREA_LABELS: &[AreaLabelDef] = &[
    area("Conceptual Cliffs", 46.0, 5.5),
    area("Resource Rock", 3.5, 8.0),
    area("Support Shoreline", 13.0, 6.7),
    area("Newsletter Nook", 15.8, 14.5),
    area("Video Vista", 23.0, 5.6),
    area("Funding Forest", 29.2, 7.0),
    area("Governance Grove", 37.7, 5.5),
    area("Strategy Summit", 34.8, 19.0),
    area("Research Range", 45.3, 15.9),
    area("Training Town", 22.2, 17.2),
    area("Empirical Escarpment", 53.5, 16.0),
    area("Podcast Port", 9.5, 20.5),
    area("Blog Beach", 15.0, 25.8),
    area("Forecasting Falls", 39.2, 23.8),
    area("Career Castle", 30.5, 29.4),
    area("Advocacy Anchorage", 8.0, 31.0),
    area("Capabilities Cove", 45.0, 27.1),
    area("Gone Graveyard", 56.0, 30.0),
];

pub fn grid_to_pixel(x: f64, y: f64) -> (f64, f64) {
    (x * GRID_UNIT, y * GRID_UNIT)
}

/// Translation that places the background inside the padded canvas.
pub fn scene_offset() -> (f64, f64) {
    (
        (PADDED_WIDTH - MAP_WIDTH) / 2.0,
        (PADDED_HEIGHT - MAP_HEIGHT) / 20.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_weight: u16,
    /// Letter spacing in pixels.
    pub letter_spacing: f64,
    pub color: &'static str,
}

impl TextStyle {
    /// CSS font shorthand for canvas contexts.
    pub fn css_font(&self) -> String {
        format!("{} {}px {}", self.font_weight, self.font_size, FONT_FAMILY)
    }
}

/// Bounding box of rendered text relative to its anchor point
/// (horizontally centered, alphabetic baseline at y = 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Measures text as the renderer will draw it.
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> TextBox;
}

/// Rounded background rectangle sized to a measured text box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pill {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
}

impl Pill {
    fn around(bbox: TextBox, origin: (f64, f64), pad_x: f64, pad_y: f64) -> Self {
        let height = bbox.height + pad_y * 2.0;
        Self {
            x: origin.0 + bbox.x - pad_x,
            y: origin.1 + bbox.y - pad_y,
            width: bbox.width + pad_x * 2.0,
            height,
            radius: height / 2.0,
        }
    }
}

/// Aspect-preserving placement of a logo inside a marker's content square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoFit {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

pub fn fit_logo(content_size: f64, image_width: f64, image_height: f64) -> Option<LogoFit> {
    if !(image_width > 0.0 && image_height > 0.0) {
        return None;
    }
    let scale = content_size / image_width.max(image_height);
    let width = image_width * scale;
    let height = image_height * scale;
    Some(LogoFit {
        width,
        height,
        offset_x: (content_size - width) / 2.0,
        offset_y: (content_size - height) / 2.0,
    })
}

/// Load state of a marker's inner circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerFill {
    /// No logo reference: solid fill.
    NoLogo,
    /// Logo requested, not yet resolved: nothing drawn over the badge.
    Pending,
    Loaded { width: f64, height: f64 },
    Failed,
}

impl MarkerFill {
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub listing_id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub label: String,
    pub center: (f64, f64),
    pub tier: ScaleTier,
    pub logo: Option<String>,
}

/// Label text position plus the pill drawn behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLayout {
    pub pill: Pill,
    pub baseline: (f64, f64),
}

impl Marker {
    pub fn from_listing(listing: &Listing) -> Option<Self> {
        let (x, y) = listing.map_position()?;
        let logo = listing
            .map_logo
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Some(Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            description: listing.description.clone(),
            link: listing.link.clone(),
            label: listing.display_name().to_string(),
            center: grid_to_pixel(x, y),
            tier: listing.scale_tier(),
            logo,
        })
    }

    pub fn icon_size(&self) -> f64 {
        BASE_LOGO_SIZE * self.tier.factor() * LOGO_GLOBAL_SCALE
    }

    pub fn content_size(&self) -> f64 {
        self.icon_size() - 2.0 * MARKER_PADDING
    }

    pub fn badge_radius(&self) -> f64 {
        self.icon_size() / 2.0
    }

    pub fn content_radius(&self) -> f64 {
        self.content_size() / 2.0
    }

    pub fn initial_fill(&self) -> MarkerFill {
        if self.logo.is_some() {
            MarkerFill::Pending
        } else {
            MarkerFill::NoLogo
        }
    }

    fn emphasis(&self) -> f64 {
        self.tier.factor() * MARKER_LABEL_EMPHASIS
    }

    pub fn label_style(&self) -> TextStyle {
        let font_size = 6.0 * self.emphasis();
        TextStyle {
            font_size,
            font_weight: 600,
            letter_spacing: -0.02 * font_size,
            color: MARKER_LABEL_COLOR,
        }
    }

    /// Vertical distance from the marker center to the label's center line.
    pub fn label_offset(&self) -> f64 {
        self.icon_size() / 2.0 + 11.0 * self.emphasis()
    }

    /// Place the label once its text has been measured.
    pub fn label_layout(&self, bbox: TextBox) -> LabelLayout {
        let pad_x = 6.0 * self.emphasis();
        let pad_y = 3.0 * self.emphasis();
        let width = bbox.width + pad_x * 2.0;
        let height = bbox.height + pad_y * 2.0;
        let center_y = self.center.1 + self.label_offset();
        LabelLayout {
            pill: Pill {
                x: self.center.0 - width / 2.0,
                y: center_y - height / 2.0,
                width,
                height,
                radius: height / 2.0,
            },
            baseline: (self.center.0, center_y + bbox.height * 0.35),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        dx * dx + dy * dy <= self.badge_radius() * self.badge_radius()
    }
}

/// One draw command. Emitted in paint order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Image {
        url: &'static str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        style: TextStyle,
    },
    RoundedRect {
        pill: Pill,
        fill: &'static str,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: &'static str,
    },
    /// Logo image clipped to a circle; `marker` indexes [`MapScene::markers`].
    LogoCircle {
        marker: usize,
        cx: f64,
        cy: f64,
        r: f64,
        image_x: f64,
        image_y: f64,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapScene {
    pub markers: Vec<Marker>,
    fingerprint: u32,
}

impl MapScene {
    /// Build markers for every placed, non-magic listing in input order.
    pub fn build(listings: &[Listing]) -> Self {
        let markers: Vec<Marker> = listings
            .iter()
            .filter(|l| !l.is_magic())
            .filter_map(Marker::from_listing)
            .collect();
        let fingerprint = fingerprint_markers(&markers);
        Self {
            markers,
            fingerprint,
        }
    }

    /// Identity of the scene input; changes whenever any marker changes.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn initial_fills(&self) -> Vec<MarkerFill> {
        self.markers.iter().map(Marker::initial_fill).collect()
    }

    /// Topmost marker under a point in map pixel space.
    pub fn marker_at(&self, x: f64, y: f64) -> Option<usize> {
        self.markers.iter().rposition(|m| m.contains(x, y))
    }

    /// Flatten the scene into draw commands.
    ///
    /// `fills` holds one entry per marker; missing entries fall back to the
    /// marker's initial state.
    pub fn shapes(&self, fills: &[MarkerFill], measure: &impl TextMeasure) -> Vec<Shape> {
        let mut shapes = Vec::with_capacity(2 + AREA_LABELS.len() * 2 + self.markers.len() * 4);

        shapes.push(Shape::Image {
            url: BACKGROUND_IMAGE_URL,
            x: 0.0,
            y: 0.0,
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
        });

        let (title_x, title_y) = grid_to_pixel(30.0, 2.5);
        shapes.push(Shape::Text {
            text: MAP_TITLE.to_string(),
            x: title_x,
            y: title_y,
            style: TextStyle {
                font_size: TITLE_FONT_SIZE,
                font_weight: 400,
                letter_spacing: TITLE_LETTER_SPACING,
                color: TITLE_COLOR,
            },
        });

        let area_style = TextStyle {
            font_size: AREA_LABEL_FONT_SIZE,
            font_weight: 600,
            letter_spacing: -0.01 * AREA_LABEL_FONT_SIZE,
            color: AREA_LABEL_COLOR,
        };
        for def in AREA_LABELS {
            let origin = grid_to_pixel(def.x, def.y);
            let bbox = measure.measure(def.label, &area_style);
            shapes.push(Shape::RoundedRect {
                pill: Pill::around(bbox, origin, AREA_LABEL_PAD_X, AREA_LABEL_PAD_Y),
                fill: AREA_PILL_COLOR,
            });
            shapes.push(Shape::Text {
                text: def.label.to_string(),
                x: origin.0,
                y: origin.1,
                style: area_style,
            });
        }

        for (idx, marker) in self.markers.iter().enumerate() {
            let (cx, cy) = marker.center;
            shapes.push(Shape::Circle {
                cx,
                cy,
                r: marker.badge_radius(),
                fill: BADGE_COLOR,
            });

            let fill = fills
                .get(idx)
                .copied()
                .unwrap_or_else(|| marker.initial_fill());
            if let Some(shape) = inner_circle(idx, marker, fill) {
                shapes.push(shape);
            }

            let style = marker.label_style();
            let layout = marker.label_layout(measure.measure(&marker.label, &style));
            shapes.push(Shape::RoundedRect {
                pill: layout.pill,
                fill: MARKER_PILL_COLOR,
            });
            shapes.push(Shape::Text {
                text: marker.label.clone(),
                x: layout.baseline.0,
                y: layout.baseline.1,
                style,
            });
        }

        shapes
    }
}

fn inner_circle(idx: usize, marker: &Marker, fill: MarkerFill) -> Option<Shape> {
    let (cx, cy) = marker.center;
    let r = marker.content_radius();
    let solid = |fill: &'static str| Shape::Circle { cx, cy, r, fill };
    match fill {
        MarkerFill::Pending => None,
        MarkerFill::NoLogo => Some(solid(NO_LOGO_COLOR)),
        MarkerFill::Failed => Some(solid(FALLBACK_COLOR)),
        MarkerFill::Loaded { width, height } => {
            let Some(fit) = fit_logo(marker.content_size(), width, height) else {
                return Some(solid(FALLBACK_COLOR));
            };
            Some(Shape::LogoCircle {
                marker: idx,
                cx,
                cy,
                r,
                image_x: cx - r + fit.offset_x,
                image_y: cy - r + fit.offset_y,
                width: fit.width,
                height: fit.height,
            })
        }
    }
}

fn fingerprint_markers(markers: &[Marker]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&(markers.len() as u64).to_le_bytes());
    for marker in markers {
        hasher.update(marker.listing_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(&marker.center.0.to_bits().to_le_bytes());
        hasher.update(&marker.center.1.to_bits().to_le_bytes());
        hasher.update(&[marker.tier as u8]);
        hasher.update(marker.label.as_bytes());
        hasher.update(&[0]);
        if let Some(logo) = &marker.logo {
            hasher.update(logo.as_bytes());
        }
        hasher.update(&[0]);
    }
    hasher.finalize()
}
