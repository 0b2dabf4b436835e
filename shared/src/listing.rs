use serde::{Deserialize, Serialize};

/// The fixed category vocabulary offered by the filter panel.
pub const CATEGORIES: &[&str] = &[
    "Advocacy",
    "Blog",
    "Capabilities research",
    "Career support",
    "Conceptual research",
    "Empirical research",
    "Forecasting",
    "Funding",
    "Governance",
    "Newsletter",
    "Podcast",
    "Research support",
    "Resource",
    "Strategy",
    "Training and education",
    "Video",
];

pub const ACTIVE_STATUS: &str = "Active";

pub const SUGGEST_ENTRY_TITLE: &str = "Suggest entry";
pub const SUGGEST_CORRECTION_TITLE: &str = "Suggest correction";
pub const DEFAULT_SUGGEST_ENTRY_LINK: &str = "/map/suggest";
pub const DEFAULT_SUGGEST_CORRECTION_LINK: &str = "#";

/// A directory entry (organization, program or project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// One or more comma-separated category tags.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub map_logo: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub scale: Option<String>,
    #[serde(default)]
    pub magic: Option<MagicRow>,
}

impl Listing {
    /// Label shown under a map marker.
    pub fn display_name(&self) -> &str {
        match self.short_name.as_deref() {
            Some(short) if !short.trim().is_empty() => short,
            _ => &self.title,
        }
    }

    /// Lower-cased, trimmed category tags.
    pub fn tags(&self) -> impl Iterator<Item = String> + '_ {
        self.category
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
    }

    /// True when `category` (any case) is a substring of any of this listing's tags.
    pub fn has_category(&self, category: &str) -> bool {
        let needle = category.to_lowercase();
        self.tags().any(|tag| tag.contains(&needle))
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }

    pub fn is_magic(&self) -> bool {
        self.magic.is_some()
    }

    /// Normalized map placement, present only when both coordinates are set.
    pub fn map_position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    pub fn scale_tier(&self) -> ScaleTier {
        self.scale
            .as_deref()
            .and_then(ScaleTier::parse)
            .unwrap_or_default()
    }
}

/// Named marker size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleTier {
    Small,
    #[default]
    Medium,
    Large,
}

impl ScaleTier {
    /// Case-insensitive parse; unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub const fn factor(self) -> f64 {
        match self {
            Self::Small => 0.4,
            Self::Medium => 0.6,
            Self::Large => 0.8,
        }
    }
}

/// Reserved rows that carry auxiliary links instead of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MagicRow {
    SuggestEntry,
    SuggestCorrection,
    /// Flagged as reserved in the data source but with an unrecognised title.
    Other(String),
}

impl MagicRow {
    /// Classify a reserved title. Matching ignores case and surrounding whitespace.
    pub fn from_title(title: &str) -> Option<Self> {
        let normalized = title.trim();
        if normalized.eq_ignore_ascii_case(SUGGEST_ENTRY_TITLE) {
            Some(Self::SuggestEntry)
        } else if normalized.eq_ignore_ascii_case(SUGGEST_CORRECTION_TITLE) {
            Some(Self::SuggestCorrection)
        } else {
            None
        }
    }

    /// Classification used by the proxy: an explicit flag wins, titles are the fallback.
    pub fn classify(title: &str, flagged: bool) -> Option<Self> {
        match Self::from_title(title) {
            Some(kind) => Some(kind),
            None if flagged => Some(Self::Other(title.trim().to_string())),
            None => None,
        }
    }
}

/// Links sourced from magic rows for the "contribute" sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryLinks {
    pub suggest_entry: String,
    pub suggest_correction: String,
}

impl Default for AuxiliaryLinks {
    fn default() -> Self {
        Self {
            suggest_entry: DEFAULT_SUGGEST_ENTRY_LINK.to_string(),
            suggest_correction: DEFAULT_SUGGEST_CORRECTION_LINK.to_string(),
        }
    }
}

impl AuxiliaryLinks {
    pub fn from_listings(listings: &[Listing]) -> Self {
        let mut links = Self::default();
        for listing in listings {
            if listing.link.is_empty() {
                continue;
            }
            match listing.magic {
                Some(MagicRow::SuggestEntry) => links.suggest_entry = listing.link.clone(),
                Some(MagicRow::SuggestCorrection) => {
                    links.suggest_correction = listing.link.clone()
                }
                _ => {}
            }
        }
        links
    }

    /// Site-relative links open in place; everything else opens a new tab.
    pub fn is_internal(link: &str) -> bool {
        link.starts_with('/')
    }
}

#[cfg(test)]
pub(crate) fn sample_listing(id: &str) -> Listing {
    Listing {
        id: id.to_string(),
        title: format!("Org {id}"),
        short_name: None,
        description: String::new(),
        category: String::new(),
        status: ACTIVE_STATUS.to_string(),
        logo: None,
        map_logo: None,
        link: format!("https://example.org/{id}"),
        x: None,
        y: None,
        scale: None,
        magic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_tier_parse_is_case_insensitive() {
        assert_eq!(ScaleTier::parse("Large"), Some(ScaleTier::Large));
        assert_eq!(ScaleTier::parse("large"), Some(ScaleTier::Large));
        assert_eq!(ScaleTier::parse(" SMALL "), Some(ScaleTier::Small));
        assert_eq!(ScaleTier::parse("huge"), None);
    }

    #[test]
    fn missing_or_unknown_scale_defaults_to_medium() {
        let mut listing = sample_listing("a");
        assert_eq!(listing.scale_tier(), ScaleTier::Medium);
        listing.scale = Some("Gigantic".into());
        assert_eq!(listing.scale_tier(), ScaleTier::Medium);
        assert!((listing.scale_tier().factor() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn map_position_requires_both_coordinates() {
        let mut listing = sample_listing("a");
        listing.x = Some(3.0);
        assert_eq!(listing.map_position(), None);
        listing.y = Some(4.5);
        assert_eq!(listing.map_position(), Some((3.0, 4.5)));
        listing.x = None;
        assert_eq!(listing.map_position(), None);
    }

    #[test]
    fn display_name_prefers_non_blank_short_name() {
        let mut listing = sample_listing("a");
        assert_eq!(listing.display_name(), "Org a");
        listing.short_name = Some("  ".into());
        assert_eq!(listing.display_name(), "Org a");
        listing.short_name = Some("OA".into());
        assert_eq!(listing.display_name(), "OA");
    }

    #[test]
    fn has_category_matches_substrings_of_trimmed_tags() {
        let mut listing = sample_listing("a");
        listing.category = "Empirical research , Funding".into();
        assert!(listing.has_category("funding"));
        assert!(listing.has_category("Empirical research"));
        assert!(listing.has_category("research"));
        assert!(!listing.has_category("Podcast"));
    }

    #[test]
    fn magic_rows_classify_by_title_or_flag() {
        assert_eq!(
            MagicRow::classify("suggest ENTRY ", false),
            Some(MagicRow::SuggestEntry)
        );
        assert_eq!(
            MagicRow::classify("Suggest correction", true),
            Some(MagicRow::SuggestCorrection)
        );
        assert_eq!(
            MagicRow::classify("Sugest entry", true),
            Some(MagicRow::Other("Sugest entry".into()))
        );
        assert_eq!(MagicRow::classify("Sugest entry", false), None);
    }

    #[test]
    fn auxiliary_links_fall_back_to_defaults() {
        let mut entry = sample_listing("m1");
        entry.magic = Some(MagicRow::SuggestEntry);
        entry.link = "https://forms.example/entry".into();
        let mut correction = sample_listing("m2");
        correction.magic = Some(MagicRow::SuggestCorrection);
        correction.link = String::new();

        let links = AuxiliaryLinks::from_listings(&[entry, correction]);
        assert_eq!(links.suggest_entry, "https://forms.example/entry");
        assert_eq!(links.suggest_correction, DEFAULT_SUGGEST_CORRECTION_LINK);
        assert!(AuxiliaryLinks::is_internal(DEFAULT_SUGGEST_ENTRY_LINK));
        assert!(!AuxiliaryLinks::is_internal(&links.suggest_entry));
    }

    #[test]
    fn listing_wire_format_is_camel_case() {
        let json = r#"{
            "id": "rec1",
            "title": "Alpha",
            "shortName": "A",
            "mapLogo": "https://cdn.example/a.png",
            "x": 10,
            "y": 20,
            "scale": "Large",
            "magic": "suggestEntry"
        }"#;
        let listing: Listing = serde_json::from_str(json).expect("listing should parse");
        assert_eq!(listing.short_name.as_deref(), Some("A"));
        assert_eq!(listing.map_logo.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(listing.map_position(), Some((10.0, 20.0)));
        assert_eq!(listing.magic, Some(MagicRow::SuggestEntry));
        assert_eq!(listing.status, "");
    }
}
