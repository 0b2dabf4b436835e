use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use atlas_shared::last_updated::DateDisplay;
use atlas_shared::{AuxiliaryLinks, Listing, ListingFilter};

use crate::api;
use crate::canvas::MapCanvas;
use crate::last_updated::{LastUpdated, UpdateSource, map_caption};
use crate::panel::{ListingsSection, load_saved_filter, save_filter};

/// Newtype wrappers so each signal gets a distinct type for Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct Listings(pub RwSignal<Vec<Listing>>);
#[derive(Clone, Copy)]
pub(crate) struct Filters(pub RwSignal<ListingFilter>);
#[derive(Clone, Copy)]
pub(crate) struct LoadStatus(pub RwSignal<LoadState>);
#[derive(Clone, Copy)]
pub(crate) struct ContributeLinks(pub Memo<AuxiliaryLinks>);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

fn scroll_past(el: &web_sys::HtmlElement) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let rect = el.get_bounding_client_rect();
    let top = window.scroll_y().unwrap_or(0.0) + rect.bottom();
    let opts = web_sys::ScrollToOptions::new();
    opts.set_top(top);
    opts.set_behavior(web_sys::ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&opts);
}

/// Root component: fetches the listing snapshot once and shares it via context.
#[component]
pub fn App() -> impl IntoView {
    let listings: RwSignal<Vec<Listing>> = RwSignal::new(Vec::new());
    let filter: RwSignal<ListingFilter> = RwSignal::new(load_saved_filter());
    let status: RwSignal<LoadState> = RwSignal::new(LoadState::Loading);
    let map_last_updated: RwSignal<Option<String>> = RwSignal::new(None);
    let links = Memo::new(move |_| listings.with(|all| AuxiliaryLinks::from_listings(all)));

    provide_context(Listings(listings));
    provide_context(Filters(filter));
    provide_context(LoadStatus(status));
    provide_context(ContributeLinks(links));

    // Persist facet selections on any change
    Effect::new(move || {
        filter.with(save_filter);
    });

    Effect::new(move || {
        spawn_local(async move {
            match api::fetch_listings().await {
                Ok(response) => {
                    map_last_updated.set(response.last_updated);
                    listings.set(response.records);
                    status.set(LoadState::Ready);
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("listing fetch failed: {e}").into());
                    status.set(LoadState::Failed(e));
                }
            }
        });
    });

    let map_wrapper = NodeRef::<leptos::html::Div>::new();
    let on_view_cards = move |_| {
        if let Some(el) = map_wrapper.get_untracked() {
            scroll_past(&el);
        }
    };

    view! {
        <main style="font-family: Inter, sans-serif; color: #1b2b3e;">
            <div style="padding: 24px;">
                <div
                    node_ref=map_wrapper
                    style="position: relative; width: 100%; aspect-ratio: 2733.5 / 1490.5; max-height: 90vh; background: #1b2b3e; border-radius: 8px; overflow: hidden;"
                >
                    <MapCanvas />
                    {move || (status.get() == LoadState::Loading).then(|| view! {
                        <p style="position: absolute; inset: 0; margin: 0; display: flex; align-items: center; justify-content: center; color: #9fc3cc; pointer-events: none;">
                            "Loading map..."
                        </p>
                    })}
                    <button
                        style="position: absolute; left: 50%; bottom: 16px; transform: translateX(-50%); padding: 8px 16px; border: none; border-radius: 999px; background: #fff; color: #1b2b3e; cursor: pointer;"
                        on:click=on_view_cards
                    >
                        "View cards"
                    </button>
                </div>
            </div>

            <div id="cards" style="max-width: 1200px; margin: 0 auto; padding: 0 24px 56px;">
                <p style="padding-bottom: 24px; font-size: 0.9rem; color: #4f7f8c;">
                    {move || map_caption(map_last_updated.get().as_deref())}
                </p>
                <h2 style="max-width: 720px; padding-bottom: 56px;">
                    "An overview of the key organizations, programs, and projects operating in the AI safety space."
                </h2>
                <ListingsSection />
            </div>

            <footer style="display: flex; gap: 24px; justify-content: center; padding: 24px; font-size: 0.8rem; color: #4f7f8c;">
                <LastUpdated source=UpdateSource::Events />
                <LastUpdated source=UpdateSource::Map display=DateDisplay::Relative />
            </footer>
        </main>
    }
}
