use std::collections::BTreeSet;

use gloo_storage::Storage;
use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;

use atlas_shared::{AuxiliaryLinks, CATEGORIES, FacetCounts, Listing, ListingFilter};

use crate::app::{ContributeLinks, Filters, Listings, LoadState, LoadStatus};

const FILTERS_STORAGE_KEY: &str = "atlas_filters";

/// The parts of [`ListingFilter`] that survive a reload. The free-text query
/// is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct SavedFilters {
    categories: BTreeSet<String>,
    show_active: bool,
    show_inactive: bool,
}

impl Default for SavedFilters {
    fn default() -> Self {
        Self::from(&ListingFilter::default())
    }
}

impl From<&ListingFilter> for SavedFilters {
    fn from(filter: &ListingFilter) -> Self {
        Self {
            categories: filter.categories.clone(),
            show_active: filter.show_active,
            show_inactive: filter.show_inactive,
        }
    }
}

impl SavedFilters {
    fn into_filter(self) -> ListingFilter {
        // Only the fixed facets can be toggled back off from the panel.
        let categories = self
            .categories
            .into_iter()
            .filter(|c| CATEGORIES.contains(&c.as_str()))
            .collect();
        ListingFilter {
            query: String::new(),
            categories,
            show_active: self.show_active,
            show_inactive: self.show_inactive,
        }
    }
}

/// Filter state restored from local storage, or the defaults.
pub fn load_saved_filter() -> ListingFilter {
    gloo_storage::LocalStorage::get::<SavedFilters>(FILTERS_STORAGE_KEY)
        .unwrap_or_default()
        .into_filter()
}

pub fn save_filter(filter: &ListingFilter) {
    let _ = gloo_storage::LocalStorage::set(FILTERS_STORAGE_KEY, SavedFilters::from(filter));
}

fn input_from(ev: &web_sys::Event) -> Option<web_sys::HtmlInputElement> {
    ev.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()
}

/// Search box, card grid and facet column.
#[component]
pub fn ListingsSection() -> impl IntoView {
    view! {
        <div style="display: grid; grid-template-columns: minmax(0, 1fr) 280px; gap: 40px; align-items: start;">
            <div>
                <SearchBox />
                <ListingCards />
            </div>
            <FilterColumn />
        </div>
    }
}

#[component]
fn SearchBox() -> impl IntoView {
    let Filters(filter) = expect_context();

    let on_input = move |ev: web_sys::Event| {
        let Some(input) = input_from(&ev) else {
            return;
        };
        filter.update(|f| f.query = input.value());
    };

    view! {
        <div style="padding-bottom: 40px;">
            <input
                type="text"
                style="width: 100%; padding: 10px 14px; border: 1px solid #c9d6df; border-radius: 6px; font-family: Inter, sans-serif; font-size: 0.95rem;"
                placeholder="Search listings by name or description"
                maxlength="256"
                prop:value=move || filter.with(|f| f.query.clone())
                on:input=on_input
            />
        </div>
    }
}

#[component]
fn ListingCards() -> impl IntoView {
    let Listings(listings) = expect_context();
    let Filters(filter) = expect_context();
    let LoadStatus(status) = expect_context();

    let visible = Memo::new(move |_| {
        let filter = filter.get();
        listings.with(|all| filter.apply(all).into_iter().cloned().collect::<Vec<_>>())
    });

    move || match status.get() {
        LoadState::Loading => view! {
            <p style="color: #4f7f8c;">"Loading..."</p>
        }
        .into_any(),
        LoadState::Failed(error) => view! {
            <p style="color: #4f7f8c;">{format!("Error: {error}")}</p>
        }
        .into_any(),
        LoadState::Ready => view! {
            <div style="display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 24px;">
                <For
                    each=move || visible.get()
                    key=|listing| listing.id.clone()
                    children=move |listing| view! { <ListingCard listing=listing /> }
                />
                {move || visible.with(Vec::is_empty).then(|| view! {
                    <p style="color: #4f7f8c;">"No items found."</p>
                })}
            </div>
        }
        .into_any(),
    }
}

#[component]
fn ListingCard(listing: Listing) -> impl IntoView {
    let Listing {
        title,
        description,
        category,
        logo,
        link,
        ..
    } = listing;

    view! {
        <a
            href=link
            target="_blank"
            rel="noopener noreferrer"
            style="display: block; padding: 24px; border-radius: 8px; background: #fff; color: #1b2b3e; text-decoration: none; box-shadow: 0 2px 8px rgba(0,0,0,0.08);"
        >
            <div style="display: flex; align-items: center; gap: 12px; padding-bottom: 24px;">
                <div style="width: 64px; height: 64px; flex: none;">
                    {logo.map(|src| view! {
                        <img src=src alt="" width="64" height="64" style="width: 64px; height: 64px; object-fit: contain;" />
                    })}
                </div>
                <h3 style="margin: 0; font-size: 1.1rem;">{title}</h3>
            </div>
            <p style="margin: 0; padding-bottom: 24px; font-size: 0.9rem; line-height: 1.45;">{description}</p>
            <p style="margin: 0; padding-bottom: 4px; font-size: 0.75rem; font-weight: 700; color: #4f7f8c;">"Category"</p>
            <p style="margin: 0; font-size: 0.9rem;">{category}</p>
        </a>
    }
}

#[component]
fn FilterColumn() -> impl IntoView {
    let Listings(listings) = expect_context();
    let Filters(filter) = expect_context();
    let ContributeLinks(links) = expect_context();

    let counts = Memo::new(move |_| listings.with(|all| FacetCounts::tally(all)));

    let category_rows = CATEGORIES
        .iter()
        .map(|&category| {
            let checked = move || filter.with(|f| f.categories.contains(category));
            let count = move || counts.with(|c| c.category(category));
            view! {
                <label style="display: flex; align-items: center; gap: 8px; padding-bottom: 16px; cursor: pointer;">
                    <input
                        type="checkbox"
                        prop:checked=checked
                        on:change=move |_| filter.update(|f| f.toggle_category(category))
                    />
                    <span style="font-size: 0.9rem; color: #4f7f8c;">
                        {category}
                        <span style="opacity: 0.7;">{move || format!(" ({})", count())}</span>
                    </span>
                </label>
            }
        })
        .collect_view();

    let on_active = move |ev: web_sys::Event| {
        if let Some(input) = input_from(&ev) {
            filter.update(|f| f.show_active = input.checked());
        }
    };
    let on_inactive = move |ev: web_sys::Event| {
        if let Some(input) = input_from(&ev) {
            filter.update(|f| f.show_inactive = input.checked());
        }
    };

    view! {
        <div>
            <div style="padding-bottom: 40px;">
                <div style="font-size: 0.9rem; padding-bottom: 16px;">"Category"</div>
                {category_rows}
            </div>
            <div style="padding-bottom: 56px;">
                <div style="font-size: 0.9rem; padding-bottom: 16px;">"Status"</div>
                <label style="display: flex; align-items: center; gap: 8px; padding-bottom: 16px; cursor: pointer;">
                    <input
                        type="checkbox"
                        prop:checked=move || filter.with(|f| f.show_active)
                        on:change=on_active
                    />
                    <span style="font-size: 0.9rem; color: #4f7f8c;">
                        "Active"
                        <span style="opacity: 0.7;">{move || format!(" ({})", counts.with(|c| c.active))}</span>
                    </span>
                </label>
                <label style="display: flex; align-items: center; gap: 8px; cursor: pointer;">
                    <input
                        type="checkbox"
                        prop:checked=move || filter.with(|f| f.show_inactive)
                        on:change=on_inactive
                    />
                    <span style="font-size: 0.9rem; color: #4f7f8c;">
                        "No longer active"
                        <span style="opacity: 0.7;">{move || format!(" ({})", counts.with(|c| c.inactive))}</span>
                    </span>
                </label>
            </div>
            <div style="display: flex; flex-direction: column; gap: 12px;">
                {move || {
                    let AuxiliaryLinks { suggest_entry, suggest_correction } = links.get();
                    view! {
                        <ContributeButton label="Suggest entry" href=suggest_entry />
                        <ContributeButton label="Suggest correction" href=suggest_correction />
                    }
                }}
            </div>
        </div>
    }
}

#[component]
fn ContributeButton(label: &'static str, href: String) -> impl IntoView {
    let external = !AuxiliaryLinks::is_internal(&href);
    view! {
        <a
            href=href
            target=external.then_some("_blank")
            rel=external.then_some("noopener noreferrer")
            style="display: block; padding: 10px 16px; border-radius: 6px; background: #1b2b3e; color: #fff; text-align: center; text-decoration: none; font-size: 0.9rem;"
        >
            {label}
        </a>
    }
}
