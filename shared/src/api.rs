use serde::{Deserialize, Serialize};

use crate::listing::Listing;

/// `GET /api/map`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponse {
    pub records: Vec<Listing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// `GET /api/last-updated/events`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsLastUpdated {
    pub last_updated: String,
    pub formatted_date: String,
}

/// `GET /api/last-updated/map`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLastUpdated {
    pub last_updated: Option<String>,
}

/// Body of every proxy error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
