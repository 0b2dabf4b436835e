use serde::de::DeserializeOwned;

use atlas_shared::{ErrorPayload, EventsLastUpdated, ListingsResponse, MapLastUpdated};

pub const LISTINGS_URL: &str = "/api/map";
pub const EVENTS_LAST_UPDATED_URL: &str = "/api/last-updated/events";
pub const MAP_LAST_UPDATED_URL: &str = "/api/last-updated/map";

/// Fetch every listing plus the map's last-updated text.
pub async fn fetch_listings() -> Result<ListingsResponse, String> {
    get_json(LISTINGS_URL).await
}

pub async fn fetch_events_last_updated() -> Result<EventsLastUpdated, String> {
    get_json(EVENTS_LAST_UPDATED_URL).await
}

pub async fn fetch_map_last_updated() -> Result<MapLastUpdated, String> {
    get_json(MAP_LAST_UPDATED_URL).await
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        let status = resp.status();
        let payload = resp.json::<ErrorPayload>().await.ok();
        return Err(error_message(status, payload));
    }

    resp.json::<T>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

fn error_message(status: u16, payload: Option<ErrorPayload>) -> String {
    match payload {
        Some(ErrorPayload {
            error,
            details: Some(details),
        }) => format!("{error} ({details})"),
        Some(ErrorPayload { error, .. }) => error,
        None => format!("HTTP {status}"),
    }
}
