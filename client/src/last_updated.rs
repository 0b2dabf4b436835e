use chrono::NaiveDate;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use atlas_shared::last_updated::DateDisplay;

use crate::api;

pub const LOADING_TEXT: &str = "Loading last updated...";

/// Which proxy endpoint a widget reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Events,
    Map,
}

/// Date fields pulled out of either endpoint's payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct DatePair {
    last_updated: Option<String>,
    formatted: Option<String>,
}

fn widget_text(
    display: DateDisplay,
    outcome: Result<DatePair, String>,
    today: NaiveDate,
) -> String {
    match outcome {
        Ok(pair) => display.render(
            pair.last_updated.as_deref(),
            pair.formatted.as_deref(),
            today,
        ),
        Err(_) => display.fallback().to_string(),
    }
}

async fn fetch_pair(source: UpdateSource) -> Result<DatePair, String> {
    match source {
        UpdateSource::Events => {
            let payload = api::fetch_events_last_updated().await?;
            Ok(DatePair {
                last_updated: Some(payload.last_updated),
                formatted: Some(payload.formatted_date),
            })
        }
        UpdateSource::Map => {
            let payload = api::fetch_map_last_updated().await?;
            Ok(DatePair {
                last_updated: payload.last_updated,
                formatted: None,
            })
        }
    }
}

/// Caption under the map: the raw metadata text once the listing fetch lands.
pub fn map_caption(last_updated: Option<&str>) -> String {
    match last_updated {
        Some(text) if !text.is_empty() => format!("Last updated: {text}"),
        _ => "Loading...".to_string(),
    }
}

#[component]
pub fn LastUpdated(
    source: UpdateSource,
    #[prop(optional)] display: DateDisplay,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let text: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move || {
        spawn_local(async move {
            let outcome = fetch_pair(source).await;
            if let Err(e) = &outcome {
                web_sys::console::warn_1(
                    &format!("last-updated fetch failed ({source:?}): {e}").into(),
                );
            }
            let today = chrono::Utc::now().date_naive();
            text.set(Some(widget_text(display, outcome, today)));
        });
    });

    view! {
        <div class=class>
            {move || text.get().unwrap_or_else(|| LOADING_TEXT.to_string())}
        </div>
    }
}
