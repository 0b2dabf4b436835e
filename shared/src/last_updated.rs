use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

/// Field names probed, in order, for a record's last-updated date.
pub const DATE_FIELD_CANDIDATES: &[&str] = &[
    "Last updated",
    "Last Updated",
    "Date",
    "Updated",
    "Last modified",
    "Modified",
];

pub const DATE_UNAVAILABLE: &str = "Last updated: Date unavailable";
pub const UPDATED_RECENTLY: &str = "Updated recently";

/// First candidate field that parses as a date, else the record creation time.
pub fn resolve_last_updated(
    fields: &Map<String, Value>,
    created_time: &str,
) -> Option<DateTime<Utc>> {
    DATE_FIELD_CANDIDATES
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(parse_date_value)
        .or_else(|| parse_date(created_time))
}

fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_date(raw),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| millis.trunc() as i64)
            })
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Accepts RFC 3339, bare dates and zone-less datetimes (read as UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// ISO 8601 with millisecond precision, e.g. `2026-10-19T00:00:00.000Z`.
pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Long British date, e.g. `19 October 2026`.
pub fn format_long_date(dt: &DateTime<Utc>) -> String {
    dt.format("%-d %B %Y").to_string()
}

/// Human label for how many calendar days ago `date` was.
pub fn relative_label(date: NaiveDate, today: NaiveDate) -> String {
    let days = (today - date).num_days();
    match days {
        i64::MIN..=0 => "Updated today".to_string(),
        1 => "Updated yesterday".to_string(),
        2..=6 => format!("Updated {days} days ago"),
        7..=13 => "Updated 1 week ago".to_string(),
        14..=29 => format!("Updated {} weeks ago", days / 7),
        30..=59 => "Updated 1 month ago".to_string(),
        _ => format!("Updated {} months ago", days / 30),
    }
}

/// Which flavor of last-updated text a widget shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateDisplay {
    #[default]
    Full,
    Relative,
}

impl DateDisplay {
    pub fn fallback(self) -> &'static str {
        match self {
            Self::Full => DATE_UNAVAILABLE,
            Self::Relative => UPDATED_RECENTLY,
        }
    }

    /// Text for a successful payload. `formatted` is the server's long form.
    pub fn render(
        self,
        last_updated: Option<&str>,
        formatted: Option<&str>,
        today: NaiveDate,
    ) -> String {
        let Some(dt) = last_updated.and_then(parse_date) else {
            return self.fallback().to_string();
        };
        match self {
            Self::Full => {
                let formatted = formatted
                    .map(str::to_string)
                    .unwrap_or_else(|| format_long_date(&dt));
                format!("Last updated: {formatted}")
            }
            Self::Relative => relative_label(dt.date_naive(), today),
        }
    }
}
