//! Minimal Airtable REST client: single-record fetch and paged table listing.

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use atlas_shared::{Listing, MagicRow};

use crate::config::AIRTABLE_PAGE_SIZE;

/// Hard stop for runaway pagination.
const MAX_PAGES: usize = 50;

#[derive(Debug, Error)]
pub enum AirtableError {
    #[error("Airtable API error: {status}")]
    Status { status: StatusCode, body: String },

    #[error("Airtable request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected Airtable payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid Airtable URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createdTime", default)]
    pub created_time: String,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl AirtableClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn record_url(
        &self,
        base: &str,
        table: &str,
        record: &str,
    ) -> Result<Url, AirtableError> {
        self.url_with_segments(&[base, table, record])
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, AirtableError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| AirtableError::Url(format!("{e}")))?;
        {
            let Ok(mut path) = url.path_segments_mut() else {
                return Err(AirtableError::Url(self.api_url.clone()));
            };
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    pub async fn fetch_record(
        &self,
        base: &str,
        table: &str,
        record: &str,
    ) -> Result<AirtableRecord, AirtableError> {
        let url = self.record_url(base, table, record)?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let body = check_status(resp).await?.bytes().await?;
        Ok(serde_json::from_slice::<AirtableRecord>(&body)?)
    }

    /// All records of a table, following `offset` pagination.
    pub async fn list_records(
        &self,
        base: &str,
        table: &str,
    ) -> Result<Vec<AirtableRecord>, AirtableError> {
        let url = self.url_with_segments(&[base, table])?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&[("pageSize", AIRTABLE_PAGE_SIZE.to_string())]);
            if let Some(offset) = offset.as_deref() {
                request = request.query(&[("offset", offset)]);
            }

            let body = check_status(request.send().await?).await?.bytes().await?;
            let page = serde_json::from_slice::<RecordPage>(&body)?;
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => return Ok(records),
            }
        }

        tracing::warn!(table, pages = MAX_PAGES, "Airtable pagination truncated");
        Ok(records)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, AirtableError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AirtableError::Status { status, body })
}

/// Reshape a listings-table record into the wire `Listing`.
pub fn listing_from_record(record: &AirtableRecord) -> Listing {
    let fields = &record.fields;
    let title = first_text(fields, &["Title", "Name"]).unwrap_or_default();
    let magic = MagicRow::classify(&title, bool_field(fields, "Magic"));

    Listing {
        id: record.id.clone(),
        short_name: text_field(fields, "Short name").filter(|s| !s.is_empty()),
        description: text_field(fields, "Description").unwrap_or_default(),
        category: text_field(fields, "Category").unwrap_or_default(),
        status: text_field(fields, "Status").unwrap_or_default(),
        logo: attachment_url(fields, "Logo"),
        map_logo: attachment_url(fields, "Map logo"),
        link: first_text(fields, &["Link", "URL"]).unwrap_or_default(),
        x: number_field(fields, "X"),
        y: number_field(fields, "Y"),
        scale: text_field(fields, "Scale").filter(|s| !s.is_empty()),
        magic,
        title,
    }
}

fn first_text(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| text_field(fields, name).filter(|s| !s.is_empty()))
}

/// Strings pass through; multi-selects and lookups are joined with ", ".
fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}

fn number_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn bool_field(fields: &Map<String, Value>, name: &str) -> bool {
    matches!(fields.get(name), Some(Value::Bool(true)))
}

/// First attachment's URL, or a plain URL string.
fn attachment_url(fields: &Map<String, Value>, name: &str) -> Option<String> {
    let url = match fields.get(name)? {
        Value::String(s) => s.trim(),
        Value::Array(items) => items.first()?.get("url")?.as_str()?.trim(),
        _ => return None,
    };
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> AirtableRecord {
        serde_json::from_value(json!({
            "id": "recA",
            "createdTime": "2025-01-01T00:00:00.000Z",
            "fields": fields,
        }))
        .expect("record should deserialize")
    }

    #[test]
    fn record_url_percent_encodes_segments() {
        let client =
            AirtableClient::new(reqwest::Client::new(), "https://api.airtable.com/v0/", "t");
        let url = client
            .record_url("appX", "Map Table", "recY")
            .expect("valid url");
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/appX/Map%20Table/recY");
    }

    #[test]
    fn listing_maps_attachments_and_coordinates() {
        let listing = listing_from_record(&record(json!({
            "Title": "Alignment Lab",
            "Short name": "AL",
            "Description": "Does alignment.",
            "Category": ["Empirical research", "Funding"],
            "Status": "Active",
            "Map logo": [{ "url": "https://cdn.example/al.png", "width": 200 }],
            "Logo": "https://cdn.example/card.png",
            "Link": "https://al.example",
            "X": 10,
            "Y": "20.5",
            "Scale": "Large",
        })));

        assert_eq!(listing.id, "recA");
        assert_eq!(listing.title, "Alignment Lab");
        assert_eq!(listing.short_name.as_deref(), Some("AL"));
        assert_eq!(listing.category, "Empirical research, Funding");
        assert_eq!(listing.map_logo.as_deref(), Some("https://cdn.example/al.png"));
        assert_eq!(listing.logo.as_deref(), Some("https://cdn.example/card.png"));
        assert_eq!(listing.map_position(), Some((10.0, 20.5)));
        assert_eq!(listing.scale.as_deref(), Some("Large"));
        assert_eq!(listing.magic, None);
    }

    #[test]
    fn missing_fields_become_empty_or_none() {
        let listing = listing_from_record(&record(json!({ "Name": "Bare" })));
        assert_eq!(listing.title, "Bare");
        assert_eq!(listing.description, "");
        assert_eq!(listing.link, "");
        assert_eq!(listing.map_logo, None);
        assert_eq!(listing.map_position(), None);
        assert_eq!(listing.scale, None);
    }

    #[test]
    fn magic_rows_are_typed() {
        let entry = listing_from_record(&record(json!({
            "Title": "Suggest entry",
            "Link": "https://forms.example/entry",
        })));
        assert_eq!(entry.magic, Some(MagicRow::SuggestEntry));

        let flagged = listing_from_record(&record(json!({
            "Title": "Suggest entyr",
            "Magic": true,
        })));
        assert_eq!(flagged.magic, Some(MagicRow::Other("Suggest entyr".into())));
    }

    #[test]
    fn non_numeric_coordinates_are_dropped() {
        let listing = listing_from_record(&record(json!({ "X": "left", "Y": 3 })));
        assert_eq!(listing.x, None);
        assert_eq!(listing.y, Some(3.0));
    }
}
