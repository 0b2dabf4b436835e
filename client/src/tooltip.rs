use leptos::prelude::*;

use atlas_shared::Marker;

/// Pointer-to-panel offset in CSS pixels.
pub const TOOLTIP_OFFSET: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipState {
    pub marker: Option<usize>,
    pub title: String,
    pub description: String,
    pub left: f64,
    pub top: f64,
}

impl TooltipState {
    pub fn is_visible(&self) -> bool {
        self.marker.is_some()
    }

    /// Show for `marker`, or just follow the pointer if it is already shown.
    pub fn hover(&mut self, index: usize, marker: &Marker, client_x: f64, client_y: f64) {
        if self.marker != Some(index) {
            self.marker = Some(index);
            self.title = marker.title.clone();
            self.description = marker.description.clone();
        }
        self.follow(client_x, client_y);
    }

    pub fn follow(&mut self, client_x: f64, client_y: f64) {
        self.left = client_x + TOOLTIP_OFFSET;
        self.top = client_y + TOOLTIP_OFFSET;
    }

    pub fn hide(&mut self) {
        *self = Self::default();
    }
}

#[component]
pub fn MarkerTooltip(state: RwSignal<TooltipState>) -> impl IntoView {
    view! {
        {move || {
            let tip = state.get();
            if !tip.is_visible() {
                return view! { <div style="display:none;" /> }.into_any();
            }
            view! {
                <div
                    class="map-tooltip"
                    style:left=format!("{}px", tip.left)
                    style:top=format!("{}px", tip.top)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #fff; color: #1b2b3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.25); max-width: 260px; padding: 8px 10px; font-family: Inter, sans-serif;"
                >
                    <div style="font-size: 0.85rem; font-weight: 700; line-height: 1.3;">{tip.title}</div>
                    {(!tip.description.is_empty()).then(|| view! {
                        <div style="font-size: 0.75rem; margin-top: 4px; line-height: 1.35;">{tip.description.clone()}</div>
                    })}
                </div>
            }
            .into_any()
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_shared::ScaleTier;

    fn marker(title: &str) -> Marker {
        Marker {
            listing_id: "rec1".into(),
            title: title.into(),
            description: "desc".into(),
            link: "https://example.org".into(),
            label: title.into(),
            center: (0.0, 0.0),
            tier: ScaleTier::Medium,
            logo: None,
        }
    }

    #[test]
    fn hover_shows_at_pointer_offset() {
        let mut tip = TooltipState::default();
        tip.hover(0, &marker("Lab"), 100.0, 50.0);
        assert!(tip.is_visible());
        assert_eq!(tip.title, "Lab");
        assert_eq!(tip.description, "desc");
        assert_eq!((tip.left, tip.top), (110.0, 60.0));
    }

    #[test]
    fn follow_moves_without_changing_content() {
        let mut tip = TooltipState::default();
        let lab = marker("Lab");
        tip.hover(2, &lab, 0.0, 0.0);
        tip.hover(2, &lab, 40.0, 30.0);
        assert_eq!(tip.marker, Some(2));
        assert_eq!((tip.left, tip.top), (50.0, 40.0));
    }

    #[test]
    fn hide_clears_state() {
        let mut tip = TooltipState::default();
        tip.hover(1, &marker("Lab"), 5.0, 5.0);
        tip.hide();
        assert!(!tip.is_visible());
        assert_eq!(tip, TooltipState::default());
    }
}
