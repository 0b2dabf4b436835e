pub mod api;
pub mod filter;
pub mod last_updated;
pub mod listing;
pub mod scene;

pub use api::*;
pub use filter::{FacetCounts, ListingFilter, mappable};
pub use listing::*;
pub use scene::{MapScene, Marker, MarkerFill, Shape, TextBox, TextMeasure, TextStyle};
