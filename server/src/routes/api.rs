use std::future::Future;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use atlas_shared::last_updated::{format_long_date, resolve_last_updated, to_iso_millis};
use atlas_shared::{EventsLastUpdated, ListingsResponse, MapLastUpdated};

use crate::airtable::{AirtableRecord, listing_from_record};
use crate::error::{
    CREDENTIALS_NOT_CONFIGURED, LAST_UPDATED_FETCH_FAILED, MAP_FETCH_FAILED, ProxyError,
    TOKEN_NOT_CONFIGURED,
};
use crate::state::{AppState, CacheKey};

const SUCCESS_CACHE_CONTROL: &str = "public, max-age=60, stale-while-revalidate=300";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "airtable_configured": state.config.airtable.is_configured(),
        "cache_entries": state.cache.len(),
        "observability": {
            "upstream_requests_total": observability.upstream_requests_total,
            "upstream_errors_total": observability.upstream_errors_total,
            "cache_hits_total": observability.cache_hits_total,
        }
    }))
}

pub async fn events_last_updated(State(state): State<AppState>) -> Response {
    serve_cached(
        &state,
        CacheKey::EventsLastUpdated,
        fetch_events_last_updated(&state),
    )
    .await
}

pub async fn map_last_updated(State(state): State<AppState>) -> Response {
    serve_cached(
        &state,
        CacheKey::MapLastUpdated,
        fetch_map_last_updated(&state),
    )
    .await
}

pub async fn map_listings(State(state): State<AppState>) -> Response {
    serve_cached(&state, CacheKey::MapListings, fetch_map_listings(&state)).await
}

/// Serve a fresh cached body, or run `fetch` and cache its success.
async fn serve_cached(
    state: &AppState,
    key: CacheKey,
    fetch: impl Future<Output = Result<Bytes, ProxyError>>,
) -> Response {
    if let Some(json) = state.cached(key) {
        return json_bytes_response(json, SUCCESS_CACHE_CONTROL);
    }

    match fetch.await {
        Ok(json) => {
            state.store(key, json.clone());
            json_bytes_response(json, SUCCESS_CACHE_CONTROL)
        }
        Err(err) => {
            if !matches!(err, ProxyError::NotConfigured(_)) {
                state.observability.record_upstream_error();
            }
            warn!(endpoint = ?key, status = %err.status(), error = %err, "proxy request failed");
            err.into_response()
        }
    }
}

async fn fetch_events_last_updated(state: &AppState) -> Result<Bytes, ProxyError> {
    let client = state
        .events_client()
        .ok_or(ProxyError::NotConfigured(TOKEN_NOT_CONFIGURED))?;
    let airtable = &state.config.airtable;

    state.observability.record_upstream_request();
    let record = client
        .fetch_record(
            &airtable.events_base_id,
            &airtable.events_table_id,
            &airtable.events_record_id,
        )
        .await
        .map_err(|e| ProxyError::from_airtable(e, LAST_UPDATED_FETCH_FAILED))?;

    let last_updated = resolve_last_updated(&record.fields, &record.created_time)
        .ok_or(ProxyError::Unavailable(LAST_UPDATED_FETCH_FAILED))?;

    to_json_bytes(
        &EventsLastUpdated {
            last_updated: to_iso_millis(&last_updated),
            formatted_date: format_long_date(&last_updated),
        },
        LAST_UPDATED_FETCH_FAILED,
    )
}

async fn fetch_map_last_updated(state: &AppState) -> Result<Bytes, ProxyError> {
    let record = fetch_map_metadata(state)
        .await
        .map_err(|e| e.without_details())?;
    to_json_bytes(
        &MapLastUpdated {
            last_updated: map_description(&record),
        },
        LAST_UPDATED_FETCH_FAILED,
    )
}

async fn fetch_map_metadata(state: &AppState) -> Result<AirtableRecord, ProxyError> {
    let (client, base_id) = state
        .map_client()
        .ok_or(ProxyError::NotConfigured(CREDENTIALS_NOT_CONFIGURED))?;
    let airtable = &state.config.airtable;

    state.observability.record_upstream_request();
    client
        .fetch_record(
            &base_id,
            &airtable.map_metadata_table_id,
            &airtable.map_last_updated_record_id,
        )
        .await
        .map_err(|e| ProxyError::from_airtable(e, LAST_UPDATED_FETCH_FAILED))
}

async fn fetch_map_listings(state: &AppState) -> Result<Bytes, ProxyError> {
    let (client, base_id) = state
        .map_client()
        .ok_or(ProxyError::NotConfigured(CREDENTIALS_NOT_CONFIGURED))?;
    let table = &state.config.airtable.listings_table;

    // Counted once per endpoint call, by the metadata fetch.
    let (records, metadata) = tokio::join!(
        client.list_records(&base_id, table),
        fetch_map_metadata(state),
    );
    let records = records
        .map_err(|e| ProxyError::from_airtable(e, MAP_FETCH_FAILED).without_details())?;

    // The listing set is still useful without its date.
    let last_updated = match metadata {
        Ok(record) => map_description(&record),
        Err(err) => {
            warn!(error = %err, "map metadata unavailable, omitting lastUpdated");
            None
        }
    };

    to_json_bytes(
        &ListingsResponse {
            records: records.iter().map(listing_from_record).collect(),
            last_updated,
        },
        MAP_FETCH_FAILED,
    )
}

fn map_description(record: &AirtableRecord) -> Option<String> {
    record
        .fields
        .get("Description")
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn to_json_bytes<T: Serialize>(payload: &T, fallback: &'static str) -> Result<Bytes, ProxyError> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|_| ProxyError::Unavailable(fallback))
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
