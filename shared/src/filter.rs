use std::collections::BTreeSet;

use crate::listing::{CATEGORIES, Listing};

/// Filter panel state: free text, selected categories and status toggles.
///
/// Groups combine with AND; selected categories combine with OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFilter {
    pub query: String,
    pub categories: BTreeSet<String>,
    pub show_active: bool,
    pub show_inactive: bool,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            categories: BTreeSet::new(),
            show_active: true,
            show_inactive: false,
        }
    }
}

impl ListingFilter {
    /// Whether a listing should be shown as a card. Magic rows never are.
    pub fn matches(&self, listing: &Listing) -> bool {
        !listing.is_magic()
            && self.matches_query(listing)
            && self.matches_categories(listing)
            && self.matches_status(listing)
    }

    pub fn apply<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        listings.iter().filter(|l| self.matches(l)).collect()
    }

    pub fn toggle_category(&mut self, category: &str) {
        if !self.categories.remove(category) {
            self.categories.insert(category.to_string());
        }
    }

    /// Raw substring match; surrounding whitespace is part of the needle.
    fn matches_query(&self, listing: &Listing) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        listing.title.to_lowercase().contains(&query)
            || listing.description.to_lowercase().contains(&query)
    }

    fn matches_categories(&self, listing: &Listing) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|category| listing.has_category(category))
    }

    fn matches_status(&self, listing: &Listing) -> bool {
        if listing.is_active() {
            self.show_active
        } else {
            self.show_inactive
        }
    }
}

/// Listings eligible for the spatial map: placed, and not magic rows.
pub fn mappable(listings: &[Listing]) -> Vec<&Listing> {
    listings
        .iter()
        .filter(|l| !l.is_magic() && l.map_position().is_some())
        .collect()
}

/// Per-facet counts shown next to each filter checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacetCounts {
    pub categories: Vec<(&'static str, usize)>,
    pub active: usize,
    pub inactive: usize,
}

impl FacetCounts {
    /// Counts over the whole snapshot, independent of the current filter.
    pub fn tally(listings: &[Listing]) -> Self {
        let mut categories: Vec<(&'static str, usize)> =
            CATEGORIES.iter().map(|&name| (name, 0)).collect();
        let mut active = 0;
        let mut inactive = 0;

        for listing in listings.iter().filter(|l| !l.is_magic()) {
            let tags: Vec<String> = listing.tags().collect();
            for (name, count) in categories.iter_mut() {
                let needle = name.to_lowercase();
                if tags.iter().any(|tag| tag.contains(&needle)) {
                    *count += 1;
                }
            }
            if listing.is_active() {
                active += 1;
            } else {
                inactive += 1;
            }
        }

        Self {
            categories,
            active,
            inactive,
        }
    }

    pub fn category(&self, name: &str) -> usize {
        self.categories
            .iter()
            .find(|(category, _)| *category == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{MagicRow, sample_listing};

    fn listing(id: &str, category: &str, status: &str) -> Listing {
        let mut l = sample_listing(id);
        l.category = category.to_string();
        l.status = status.to_string();
        l
    }

    fn ids(listings: Vec<&Listing>) -> Vec<&str> {
        listings.into_iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn no_selected_categories_passes_everything() {
        let listings = vec![
            listing("a", "Funding", "Active"),
            listing("b", "", "Active"),
        ];
        let filter = ListingFilter::default();
        assert_eq!(ids(filter.apply(&listings)), vec!["a", "b"]);
    }

    #[test]
    fn selected_categories_are_or_combined() {
        let listings = vec![
            listing("a", "Funding", "Active"),
            listing("b", "Podcast, Video", "Active"),
            listing("c", "Governance", "Active"),
        ];
        let mut filter = ListingFilter::default();
        filter.toggle_category("Funding");
        filter.toggle_category("Video");
        assert_eq!(ids(filter.apply(&listings)), vec!["a", "b"]);

        filter.toggle_category("Funding");
        assert_eq!(ids(filter.apply(&listings)), vec!["b"]);
    }

    #[test]
    fn status_toggles_split_on_exact_active() {
        let listings = vec![
            listing("a", "", "Active"),
            listing("b", "", "active"),
            listing("c", "", "Inactive"),
            listing("d", "", ""),
        ];
        let mut filter = ListingFilter::default();
        assert_eq!(ids(filter.apply(&listings)), vec!["a"]);

        filter.show_inactive = true;
        assert_eq!(ids(filter.apply(&listings)), vec!["a", "b", "c", "d"]);

        filter.show_active = false;
        assert_eq!(ids(filter.apply(&listings)), vec!["b", "c", "d"]);

        filter.show_inactive = false;
        assert!(filter.apply(&listings).is_empty());
    }

    #[test]
    fn query_matches_title_or_description_case_insensitively() {
        let mut a = listing("a", "", "Active");
        a.title = "Alignment Forum".into();
        let mut b = listing("b", "", "Active");
        b.description = "A newsletter about ALIGNMENT".into();
        let c = listing("c", "", "Active");
        let listings = vec![a, b, c];

        let filter = ListingFilter {
            query: "alignment".into(),
            ..ListingFilter::default()
        };
        assert_eq!(ids(filter.apply(&listings)), vec!["a", "b"]);
    }

    #[test]
    fn query_whitespace_is_matched_literally() {
        let mut a = listing("a", "", "Active");
        a.title = "Fundraiser".into();
        a.description = String::new();
        let listings = vec![a];

        let matching = |query: &str| {
            let filter = ListingFilter {
                query: query.into(),
                ..ListingFilter::default()
            };
            filter.apply(&listings).len()
        };
        assert_eq!(matching("fund"), 1);
        assert_eq!(matching(" fund"), 0);
        assert_eq!(matching("raiser "), 0);
        assert_eq!(matching("   "), 0);
        assert_eq!(matching(""), 1);
    }

    #[test]
    fn groups_combine_with_and() {
        let mut a = listing("a", "Funding", "Active");
        a.title = "Fund One".into();
        let mut b = listing("b", "Funding", "Inactive");
        b.title = "Fund Two".into();
        let mut c = listing("c", "Blog", "Active");
        c.title = "Fund Blog".into();
        let listings = vec![a, b, c];

        let mut filter = ListingFilter {
            query: "fund".into(),
            ..ListingFilter::default()
        };
        filter.toggle_category("Funding");
        assert_eq!(ids(filter.apply(&listings)), vec!["a"]);
    }

    #[test]
    fn magic_rows_are_hidden_and_uncounted() {
        let mut magic = listing("m", "Funding", "Active");
        magic.magic = Some(MagicRow::SuggestEntry);
        let listings = vec![magic, listing("a", "Funding", "Active")];

        let filter = ListingFilter::default();
        assert_eq!(ids(filter.apply(&listings)), vec!["a"]);

        let counts = FacetCounts::tally(&listings);
        assert_eq!(counts.category("Funding"), 1);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.inactive, 0);
    }

    #[test]
    fn facet_counts_use_substring_rule() {
        let listings = vec![
            listing("a", "Empirical research, Research support", "Active"),
            listing("b", "Capabilities research", "Dormant"),
        ];
        let counts = FacetCounts::tally(&listings);
        assert_eq!(counts.categories.len(), CATEGORIES.len());
        assert_eq!(counts.category("Empirical research"), 1);
        assert_eq!(counts.category("Research support"), 1);
        assert_eq!(counts.category("Capabilities research"), 1);
        assert_eq!(counts.category("Video"), 0);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.inactive, 1);
    }

    #[test]
    fn unplaced_listings_skip_map_but_stay_filterable() {
        let mut placed = listing("a", "", "Active");
        placed.x = Some(1.0);
        placed.y = Some(2.0);
        let mut half = listing("b", "", "Active");
        half.x = Some(1.0);
        let listings = vec![placed, half];

        assert_eq!(ids(mappable(&listings)), vec!["a"]);
        assert_eq!(ids(ListingFilter::default().apply(&listings)), vec!["a", "b"]);
    }
}
